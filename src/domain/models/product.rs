// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 显卡芯片品牌
///
/// 由商品标题推断得到，无法识别时为 `Other`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChipBrand {
    Nvidia,
    Amd,
    Intel,
    #[default]
    Other,
}

impl ChipBrand {
    pub const ALL: [ChipBrand; 4] = [
        ChipBrand::Nvidia,
        ChipBrand::Amd,
        ChipBrand::Intel,
        ChipBrand::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChipBrand::Nvidia => "NVIDIA",
            ChipBrand::Amd => "AMD",
            ChipBrand::Intel => "INTEL",
            ChipBrand::Other => "OTHER",
        }
    }
}

impl fmt::Display for ChipBrand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChipBrand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NVIDIA" => Ok(ChipBrand::Nvidia),
            "AMD" => Ok(ChipBrand::Amd),
            "INTEL" => Ok(ChipBrand::Intel),
            "OTHER" => Ok(ChipBrand::Other),
            _ => Err(format!("Invalid chip brand: {}", s)),
        }
    }
}

/// 支持抓取的店铺
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Store {
    Pichau,
    Kabum,
    Terabyte,
}

impl Store {
    pub const ALL: [Store; 3] = [Store::Pichau, Store::Kabum, Store::Terabyte];

    /// 稳定的店铺标识，用于配置和持久化
    pub fn id(&self) -> &'static str {
        match self {
            Store::Pichau => "pichau",
            Store::Kabum => "kabum",
            Store::Terabyte => "terabyte",
        }
    }

    /// 展示用名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Store::Pichau => "Pichau",
            Store::Kabum => "Kabum",
            Store::Terabyte => "TerabyteShop",
        }
    }

    /// 用于补全相对链接的站点根地址
    pub fn base_url(&self) -> &'static str {
        match self {
            Store::Pichau => "https://www.pichau.com.br",
            Store::Kabum => "https://www.kabum.com.br",
            Store::Terabyte => "https://www.terabyteshop.com.br",
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Store {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pichau" => Ok(Store::Pichau),
            "kabum" => Ok(Store::Kabum),
            "terabyte" | "terabyteshop" => Ok(Store::Terabyte),
            _ => Err(format!("Unknown store: {}", s)),
        }
    }
}

/// 规范化后的价格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    /// 数值金额
    pub amount: f64,
    /// ISO 4217 货币代码
    pub currency: String,
    /// 页面上的原始价格文本
    pub raw: String,
}

impl Price {
    pub const DEFAULT_CURRENCY: &'static str = "BRL";

    pub fn brl(amount: f64, raw: impl Into<String>) -> Self {
        Self {
            amount,
            currency: Self::DEFAULT_CURRENCY.to_string(),
            raw: raw.into(),
        }
    }
}

/// 交给持久化层的商品
///
/// URL 是全局唯一的自然键，同一 URL 的重复写入会原地更新
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedProduct {
    pub title: String,
    pub price: Price,
    pub url: String,
    pub store: Store,
    pub chip_brand: ChipBrand,
    pub manufacturer: String,
    pub model: String,
    pub available: bool,
    pub scraped_at: DateTime<Utc>,
}

/// 已持久化的商品
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProduct {
    pub id: Uuid,
    pub product: EnrichedProduct,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
