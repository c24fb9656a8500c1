// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::fixtures::{page_url, terabyte_listing};
use super::helpers::test_config;
use gpuscout::application::use_cases::scrape_store::ScrapeStoreUseCase;
use gpuscout::config::settings::DetectionSettings;
use gpuscout::domain::models::product::Store;
use gpuscout::engines::snapshot_session::{SnapshotSession, SnapshotSessionFactory};
use gpuscout::infrastructure::repositories::in_memory::{
    InMemoryProductRepository, InMemoryScrapeRunRepository,
};
use gpuscout::infrastructure::storage::SnapshotStore;
use gpuscout::scrapers::registry::ScraperRegistry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 测试保存到磁盘的快照可以离线回放
#[tokio::test]
async fn test_saved_snapshots_replay_offline() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    for page in 1..=2 {
        store
            .save(Store::Terabyte, &page_url("terabyte", page), &terabyte_listing(page))
            .await
            .unwrap();
    }

    let pages = SnapshotSession::load_dir(dir.path()).await.unwrap();
    assert_eq!(pages.len(), 2);

    let products = Arc::new(InMemoryProductRepository::new());
    let use_case = ScrapeStoreUseCase::new(
        products.clone(),
        Arc::new(InMemoryScrapeRunRepository::new()),
        ScraperRegistry::with_defaults(),
        Arc::new(SnapshotSessionFactory::new(pages)),
        &DetectionSettings::default(),
    );

    let metrics = use_case
        .execute("terabyte", &test_config(2), &CancellationToken::new())
        .await;

    assert!(metrics.success);
    assert_eq!(metrics.pages_scraped, 2);
    assert_eq!(metrics.products_saved, 6);
    assert_eq!(products.len(), 6);
}
