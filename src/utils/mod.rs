// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 提供错误类型、重试策略、人类行为模拟、URL处理和日志初始化
pub mod errors;
pub mod humanize;
pub mod retry_policy;
pub mod telemetry;
pub mod url_utils;
