// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含商店抓取用例和对外的数据传输对象
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// 浏览器会话契约及其 Chromium 和快照实现
pub mod engines;

/// 基础设施模块
///
/// 提供数据库、指标和快照存储等外部集成
pub mod infrastructure;

/// 商店抓取器模块
///
/// 每个商店的选择器、分页和特殊处理
pub mod scrapers;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 定时抓取调度
pub mod workers;
