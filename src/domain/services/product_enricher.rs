// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::domain::models::product::ChipBrand;

/// 无法识别厂商时使用的值
pub const GENERIC_MANUFACTURER: &str = "Generic";
/// 无法识别型号时使用的值
pub const UNKNOWN_MODEL: &str = "Unknown";

/// 已知的显卡厂商，按匹配优先级排列
pub const KNOWN_MANUFACTURERS: [&str; 25] = [
    "ASUS",
    "MSI",
    "GIGABYTE",
    "GALAX",
    "XFX",
    "ASROCK",
    "ZOTAC",
    "PNY",
    "POWERCOLOR",
    "SAPPHIRE",
    "COLORFUL",
    "INNO3D",
    "PALIT",
    "EVGA",
    "PCYES",
    "MANCER",
    "GAINWARD",
    "AFOX",
    "BIOSTAR",
    "MANLI",
    "MAXSUN",
    "LEADTEK",
    "SPARKLE",
    "SUPERFRAME",
    "DUEX",
];

// Priority is fixed: NVIDIA, then AMD, then INTEL
const BRAND_KEYWORDS: [(ChipBrand, &[&str]); 3] = [
    (ChipBrand::Nvidia, &["GEFORCE", "RTX", "GTX", "NVIDIA"]),
    (ChipBrand::Amd, &["RADEON", "RX", "AMD"]),
    (ChipBrand::Intel, &["ARC", "INTEL"]),
];

static NVIDIA_MODEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(RTX|GTX)\s*(\d{3,4})\s*(TI|SUPER)?").unwrap());

// XTX must precede XT in the alternation
static AMD_MODEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(RX)\s*(\d{3,4})\s*(XTX|XT|GRE)?").unwrap());

static INTEL_MODEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(ARC)\s*([A-Z]\d{3})").unwrap());

/// 芯片品牌识别
pub struct ChipBrandDetector;

impl ChipBrandDetector {
    pub fn detect(title: &str) -> ChipBrand {
        let upper = title.to_uppercase();
        BRAND_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| upper.contains(k)))
            .map(|(brand, _)| *brand)
            .unwrap_or(ChipBrand::Other)
    }
}

/// 厂商识别
///
/// 先在标题中查找；找不到时在 URL 中查找被 `-` 或 `/` 包围的厂商片段
pub struct ManufacturerDetector;

impl ManufacturerDetector {
    pub fn detect(title: &str, url: &str) -> &'static str {
        let upper = title.to_uppercase();
        if let Some(found) = KNOWN_MANUFACTURERS.iter().find(|m| upper.contains(*m)) {
            return *found;
        }

        let url_lower = url.to_lowercase();
        if !url_lower.is_empty() {
            for manufacturer in KNOWN_MANUFACTURERS {
                let token = manufacturer.to_lowercase();
                if url_lower.contains(&format!("-{}-", token))
                    || url_lower.contains(&format!("/{}-", token))
                {
                    return manufacturer;
                }
            }
        }

        GENERIC_MANUFACTURER
    }
}

/// 型号提取
pub struct ModelExtractor;

impl ModelExtractor {
    /// 只使用 `brand` 对应的型号规则，`Other` 没有型号
    pub fn extract(title: &str, brand: ChipBrand) -> String {
        let pattern: &Regex = match brand {
            ChipBrand::Nvidia => &NVIDIA_MODEL,
            ChipBrand::Amd => &AMD_MODEL,
            ChipBrand::Intel => &INTEL_MODEL,
            ChipBrand::Other => return UNKNOWN_MODEL.to_string(),
        };

        let upper = title.to_uppercase();
        pattern
            .captures(&upper)
            .map(|caps| {
                caps.iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_else(|| UNKNOWN_MODEL.to_string())
    }
}

/// 富化结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub chip_brand: ChipBrand,
    pub manufacturer: String,
    pub model: String,
}

/// 组合三个识别器，纯函数、无副作用
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductEnricher;

impl ProductEnricher {
    pub fn new() -> Self {
        Self
    }

    pub fn enrich(&self, title: &str, url: &str) -> Enrichment {
        let chip_brand = ChipBrandDetector::detect(title);
        let enrichment = Enrichment {
            chip_brand,
            manufacturer: ManufacturerDetector::detect(title, url).to_string(),
            model: ModelExtractor::extract(title, chip_brand),
        };

        debug!(
            title = %title.chars().take(50).collect::<String>(),
            chip = %enrichment.chip_brand,
            manufacturer = %enrichment.manufacturer,
            model = %enrichment.model,
            "product_enriched"
        );

        enrichment
    }
}
