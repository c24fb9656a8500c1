// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::extraction::PriceBounds;
use crate::config::settings::ScraperSettings;

/// 单次运行的抓取参数
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_price_bounds"))]
pub struct ScrapeConfig {
    pub headless: bool,
    #[validate(range(min = 1, max = 500))]
    pub max_pages: u32,
    /// 单页超时（毫秒）
    #[validate(range(min = 1))]
    pub timeout_ms: u64,
    #[validate(range(min = 0.0))]
    pub min_price: f64,
    pub max_price: f64,
    #[validate(range(min = 1))]
    pub error_threshold: u32,
    #[validate(range(min = 1))]
    pub consecutive_failure_limit: u32,
    pub min_product_cards: usize,
    #[validate(range(min = 1, max = 10))]
    pub navigation_attempts: u32,
    pub retry_base_delay_ms: u64,
}

fn validate_price_bounds(config: &ScrapeConfig) -> Result<(), ValidationError> {
    if config.min_price >= config.max_price {
        return Err(ValidationError::new("min_price_not_below_max_price"));
    }
    Ok(())
}

impl ScrapeConfig {
    pub fn price_bounds(&self) -> PriceBounds {
        PriceBounds::new(self.min_price, self.max_price)
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self::from(&ScraperSettings::default())
    }
}

impl From<&ScraperSettings> for ScrapeConfig {
    fn from(settings: &ScraperSettings) -> Self {
        Self {
            headless: settings.headless,
            max_pages: settings.max_pages,
            timeout_ms: settings.timeout_ms,
            min_price: settings.min_price,
            max_price: settings.max_price,
            error_threshold: settings.error_threshold,
            consecutive_failure_limit: settings.consecutive_failure_limit,
            min_product_cards: settings.min_product_cards,
            navigation_attempts: settings.navigation_attempts,
            retry_base_delay_ms: settings.retry_base_delay_ms,
        }
    }
}
