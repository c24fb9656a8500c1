// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由基础设施层提供（sea-orm 与内存实现）。
///
/// 包含的仓库接口：
/// - 商品仓库（product_repository）：按 URL upsert 商品并提供查询与统计
/// - 抓取运行仓库（scrape_run_repository）：保存运行记录并提供统计
pub mod product_repository;
pub mod scrape_run_repository;
