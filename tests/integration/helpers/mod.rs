// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod fixtures;
pub mod recording_session;

use gpuscout::application::use_cases::scrape_store::ScrapeStoreUseCase;
use gpuscout::config::settings::DetectionSettings;
use gpuscout::domain::models::scrape_config::ScrapeConfig;
use gpuscout::engines::snapshot_session::SnapshotPage;
use gpuscout::infrastructure::repositories::in_memory::{
    InMemoryProductRepository, InMemoryScrapeRunRepository,
};
use gpuscout::scrapers::registry::ScraperRegistry;
use std::collections::HashMap;
use std::sync::Arc;

use recording_session::{Fault, RecordingFactory, SessionProbe};

/// 测试用的完整抓取环境
pub struct TestHarness {
    pub use_case: ScrapeStoreUseCase<InMemoryProductRepository, InMemoryScrapeRunRepository>,
    pub products: Arc<InMemoryProductRepository>,
    pub runs: Arc<InMemoryScrapeRunRepository>,
    pub probe: SessionProbe,
}

/// 用给定页面和故障构建抓取用例
pub fn create_harness(pages: HashMap<String, SnapshotPage>, fault: Option<Fault>) -> TestHarness {
    let products = Arc::new(InMemoryProductRepository::new());
    let runs = Arc::new(InMemoryScrapeRunRepository::new());
    let probe = SessionProbe::default();
    let factory = RecordingFactory::new(pages, probe.clone(), fault);

    let use_case = ScrapeStoreUseCase::new(
        products.clone(),
        runs.clone(),
        ScraperRegistry::with_defaults(),
        Arc::new(factory),
        &DetectionSettings::default(),
    );

    TestHarness {
        use_case,
        products,
        runs,
        probe,
    }
}

/// 小页面也能通过最小卡片数检查的配置
pub fn test_config(max_pages: u32) -> ScrapeConfig {
    let mut config = ScrapeConfig::default().with_max_pages(max_pages);
    config.min_product_cards = 1;
    config
}
