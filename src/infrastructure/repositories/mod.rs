// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供领域仓库接口的 SeaORM 实现和内存实现
pub mod in_memory;
pub mod product_repo_impl;
pub mod scrape_run_repo_impl;
