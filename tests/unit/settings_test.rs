// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use gpuscout::config::settings::{BrowserEngine, Settings};
use gpuscout::domain::models::scrape_config::ScrapeConfig;
use validator::Validate;

/// 测试从 config/default.toml 加载配置
#[test]
fn test_config_loading_from_default_toml() {
    let settings = Settings::new().expect("default configuration loads");

    assert_eq!(settings.scraper.max_pages, 20);
    assert_eq!(settings.scraper.error_threshold, 3);
    assert_eq!(settings.scraper.min_price, 100.0);
    assert_eq!(settings.scraper.max_price, 50_000.0);
    assert_eq!(settings.browser.engine, BrowserEngine::Chromium);
    assert_eq!(settings.scheduler.stores, vec!["pichau", "kabum", "terabyte"]);
    assert!(settings
        .detection
        .captcha_title_keywords
        .iter()
        .any(|k| k == "just a moment"));
}

#[test]
fn test_scrape_config_from_settings_is_valid() {
    let settings = Settings::new().expect("default configuration loads");
    let config = ScrapeConfig::from(&settings.scraper);

    assert!(config.validate().is_ok());
    assert_eq!(config.price_bounds().min, 100.0);
}

#[test]
fn test_scrape_config_rejects_zero_pages() {
    let config = ScrapeConfig::default().with_max_pages(0);
    assert!(config.validate().is_err());
}
