// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 商店抓取器模块
///
/// 每个商店提供选择器、分页规则和价格提取的特殊处理
pub mod kabum;
pub mod pichau;
pub mod registry;
pub mod selectors;
pub mod terabyte;
pub mod traits;
