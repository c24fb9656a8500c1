// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施模块
///
/// 数据库、仓库实现、指标和调试快照存储
pub mod database;
pub mod metrics;
pub mod repositories;
pub mod storage;
