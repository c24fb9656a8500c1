// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::product::Price;
use crate::domain::services::price_parser::PriceParser;

/// 合理价格区间（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBounds {
    pub min: f64,
    pub max: f64,
}

impl PriceBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

impl Default for PriceBounds {
    fn default() -> Self {
        Self::new(100.0, 50_000.0)
    }
}

/// 每个字段命中的选择器，用于诊断
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedSelectors {
    pub title: Option<String>,
    pub price: Option<String>,
    pub link: Option<String>,
    pub availability: Option<String>,
}

/// 从单个商品卡片提取出的原始记录
///
/// 只在一次逐元素处理中存在：要么通过校验后变成商品，要么被丢弃
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub title: Option<String>,
    pub price_raw: Option<String>,
    pub price_value: Option<f64>,
    pub url: Option<String>,
    pub available: bool,
    pub matched: MatchedSelectors,
}

/// 校验失败的原因，是正常结果而不是错误
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    MissingTitle,
    MissingPrice,
    NonPositivePrice(f64),
    PriceOutOfRange { value: f64, bounds: PriceBounds },
    MissingUrl,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationFailure::MissingTitle => write!(f, "missing title"),
            ValidationFailure::MissingPrice => write!(f, "missing price"),
            ValidationFailure::NonPositivePrice(v) => write!(f, "non-positive price {}", v),
            ValidationFailure::PriceOutOfRange { value, bounds } => write!(
                f,
                "price {} outside [{}, {}]",
                value, bounds.min, bounds.max
            ),
            ValidationFailure::MissingUrl => write!(f, "missing url"),
        }
    }
}

/// 通过校验的记录
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRecord {
    pub title: String,
    pub price: Price,
    pub url: String,
    pub available: bool,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ExtractedRecord {
    /// 标题、原始价格、正数价格和 URL 都存在
    pub fn is_valid(&self) -> bool {
        non_empty(&self.title).is_some()
            && non_empty(&self.price_raw).is_some()
            && self.price_value.is_some_and(|v| v > 0.0)
            && non_empty(&self.url).is_some()
    }

    /// 按基本不变量和价格区间校验
    /// 价格区间检查交给 `parser`，区间来自运行配置
    pub fn validate(&self, parser: &PriceParser) -> Result<ValidRecord, ValidationFailure> {
        let title = non_empty(&self.title).ok_or(ValidationFailure::MissingTitle)?;
        let raw = non_empty(&self.price_raw).ok_or(ValidationFailure::MissingPrice)?;
        let value = self.price_value.ok_or(ValidationFailure::MissingPrice)?;
        if value <= 0.0 {
            return Err(ValidationFailure::NonPositivePrice(value));
        }
        if !parser.is_plausible(value) {
            return Err(ValidationFailure::PriceOutOfRange {
                value,
                bounds: parser.bounds(),
            });
        }
        let url = non_empty(&self.url).ok_or(ValidationFailure::MissingUrl)?;

        Ok(ValidRecord {
            title: title.to_string(),
            price: Price::brl(value, raw),
            url: url.to_string(),
            available: self.available,
        })
    }
}
