// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 纯函数式的业务规则，不做任何 I/O：
/// - 价格解析（price_parser）：本地化价格文本与分期价格过滤
/// - 商品富化（product_enricher）：芯片品牌、厂商和型号识别
/// - 页面检测（page_inspector）：验证码、维护页和缺货关键字
pub mod page_inspector;
pub mod price_parser;
pub mod product_enricher;
