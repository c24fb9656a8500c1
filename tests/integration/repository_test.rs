// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{Duration, Utc};
use gpuscout::config::settings::DatabaseSettings;
use gpuscout::domain::models::product::{ChipBrand, EnrichedProduct, Price, Store};
use gpuscout::domain::models::scrape_run::{ScrapeRun, StopReason};
use gpuscout::domain::repositories::product_repository::ProductRepository;
use gpuscout::domain::repositories::scrape_run_repository::ScrapeRunRepository;
use gpuscout::infrastructure::database::connection;
use gpuscout::infrastructure::repositories::product_repo_impl::ProductRepoImpl;
use gpuscout::infrastructure::repositories::scrape_run_repo_impl::ScrapeRunRepoImpl;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

async fn memory_db() -> Arc<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        run_migrations: true,
        ..DatabaseSettings::default()
    };
    Arc::new(connection::connect_and_migrate(&settings).await.unwrap())
}

fn product(url: &str, title: &str, amount: f64, chip: ChipBrand, available: bool) -> EnrichedProduct {
    EnrichedProduct {
        title: title.to_string(),
        price: Price::brl(amount, format!("R$ {:.2}", amount)),
        url: url.to_string(),
        store: Store::Kabum,
        chip_brand: chip,
        manufacturer: "ASUS".to_string(),
        model: "RTX 4070".to_string(),
        available,
        scraped_at: Utc::now(),
    }
}

/// 测试同一URL写入两次只保留一条记录，且标题为最新值
#[tokio::test]
async fn test_upsert_keeps_one_record_per_url() {
    let repo = ProductRepoImpl::new(memory_db().await);
    let url = "https://www.kabum.com.br/produto/1";

    let first = repo
        .upsert(&product(url, "ASUS RTX 4070 Dual", 4299.9, ChipBrand::Nvidia, true))
        .await
        .unwrap();
    let second = repo
        .upsert(&product(url, "ASUS RTX 4070 Dual OC", 4199.9, ChipBrand::Nvidia, false))
        .await
        .unwrap();

    assert_eq!(first, second);
    let stored = repo.find_by_url(url).await.unwrap().expect("stored product");
    assert_eq!(stored.product.title, "ASUS RTX 4070 Dual OC");
    assert_eq!(stored.product.price.amount, 4199.9);
    assert!(!stored.product.available);
    assert_eq!(repo.stats().await.unwrap().total, 1);
}

/// 测试最低价查询只返回有货商品并按价格排序
#[tokio::test]
async fn test_best_deals_orders_available_products_by_price() {
    let repo = ProductRepoImpl::new(memory_db().await);
    repo.upsert(&product("https://k/1", "RTX 4090", 12999.0, ChipBrand::Nvidia, true))
        .await
        .unwrap();
    repo.upsert(&product("https://k/2", "RX 7600", 1599.0, ChipBrand::Amd, true))
        .await
        .unwrap();
    repo.upsert(&product("https://k/3", "RTX 4060", 1899.0, ChipBrand::Nvidia, true))
        .await
        .unwrap();
    repo.upsert(&product("https://k/4", "RTX 3050", 999.0, ChipBrand::Nvidia, false))
        .await
        .unwrap();

    let deals = repo.best_deals(10, None).await.unwrap();
    let urls: Vec<_> = deals.iter().map(|p| p.product.url.as_str()).collect();
    assert_eq!(urls, vec!["https://k/2", "https://k/3", "https://k/1"]);

    let nvidia = repo.best_deals(1, Some(ChipBrand::Nvidia)).await.unwrap();
    assert_eq!(nvidia.len(), 1);
    assert_eq!(nvidia[0].product.url, "https://k/3");
}

/// 测试商品统计
#[tokio::test]
async fn test_product_stats() {
    let repo = ProductRepoImpl::new(memory_db().await);
    repo.upsert(&product("https://k/1", "RTX 4070", 4000.0, ChipBrand::Nvidia, true))
        .await
        .unwrap();
    repo.upsert(&product("https://k/2", "RX 7800 XT", 3000.0, ChipBrand::Amd, false))
        .await
        .unwrap();

    let stats = repo.stats().await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.available, 1);
    assert_eq!(stats.by_store.get("kabum"), Some(&2));
    assert_eq!(stats.by_chip_brand.get("AMD"), Some(&1));
    assert_eq!(stats.average_price, Some(3500.0));
    assert_eq!(stats.min_price, Some(3000.0));
    assert_eq!(stats.max_price, Some(4000.0));

    assert_eq!(repo.delete_older_than(30).await.unwrap(), 0);
}

/// 测试运行记录的保存、查询和统计
#[tokio::test]
async fn test_scrape_run_round_trip_and_stats() {
    let repo = ScrapeRunRepoImpl::new(memory_db().await);

    let mut ok = ScrapeRun::start(Store::Pichau);
    ok.record_page();
    ok.record_products_found(20);
    for _ in 0..18 {
        ok.record_saved();
    }
    ok.record_skipped();
    ok.record_skipped();
    ok.finish_successfully(StopReason::MaxPagesReached);

    let mut failed = ScrapeRun::start(Store::Kabum);
    failed.record_captcha();
    failed.finish_with_error(StopReason::CaptchaDetected, "stopped early without saving");

    let id = repo.save(&ok).await.unwrap();
    assert_eq!(id, ok.id());
    repo.save(&failed).await.unwrap();

    let pichau = repo.recent(10, Some(Store::Pichau)).await.unwrap();
    assert_eq!(pichau.len(), 1);
    let restored = &pichau[0];
    assert_eq!(restored.counters().products_saved, 18);
    assert_eq!(restored.counters().products_skipped, 2);
    assert_eq!(restored.stop_reason(), Some(StopReason::MaxPagesReached));
    assert!(restored.is_success());

    let all = repo.recent(10, None).await.unwrap();
    assert_eq!(all.len(), 2);
    let captcha = all.iter().find(|r| r.store() == Store::Kabum).unwrap();
    assert!(!captcha.is_success());
    assert_eq!(captcha.error_message(), Some("stopped early without saving"));

    let stats = repo.stats(Utc::now() - Duration::hours(1)).await.unwrap();
    assert_eq!(stats.total_runs, 2);
    assert_eq!(stats.successful_runs, 1);
    assert_eq!(stats.success_rate, 50.0);
}
