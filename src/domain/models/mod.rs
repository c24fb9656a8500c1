// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 商品（product）：店铺、芯片品牌、价格和富化后的商品
/// - 抓取运行（scrape_run）：一次店铺抓取的计数与结果
/// - 提取记录（extraction）：单个商品卡片的原始提取结果及其校验
/// - 抓取参数（scrape_config）：单次运行的已校验配置
pub mod extraction;
pub mod product;
pub mod scrape_config;
pub mod scrape_run;
