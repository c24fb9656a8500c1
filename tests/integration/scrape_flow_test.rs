// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::fixtures::{
    challenge_page, maintenance_page, page_url, terabyte_listing, terabyte_page, terabyte_site, Card,
};
use super::helpers::recording_session::Fault;
use super::helpers::{create_harness, test_config};
use gpuscout::domain::models::product::{ChipBrand, Store};
use gpuscout::domain::models::scrape_config::ScrapeConfig;
use gpuscout::domain::models::scrape_run::StopReason;
use gpuscout::domain::repositories::product_repository::ProductRepository;
use gpuscout::engines::snapshot_session::SnapshotPage;
use gpuscout::infrastructure::storage::SnapshotStore;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 测试一个页面上三张卡片：两张有效，一张缺少价格
#[tokio::test]
async fn test_page_with_one_invalid_card() {
    let html = terabyte_page(&[
        Card::new("Placa de Vídeo Gigabyte GeForce RTX 4060 Eagle OC", "R$ 1.999,90", "/produto/1/rtx-4060"),
        Card::new("Placa de Vídeo XFX Speedster AMD Radeon RX 7600", "R$ 1.599,00", "/produto/2/rx-7600"),
        Card::without_price("Placa de Vídeo MSI GeForce RTX 4090 Suprim X", "/produto/3/rtx-4090"),
    ]);
    let mut pages = HashMap::new();
    pages.insert(page_url("terabyte", 1), SnapshotPage::Html(html));
    let harness = create_harness(pages, None);

    let metrics = harness
        .use_case
        .execute("terabyte", &test_config(1), &CancellationToken::new())
        .await;

    assert!(metrics.success);
    assert_eq!(metrics.products_found, 3);
    assert_eq!(metrics.products_saved, 2);
    assert_eq!(metrics.products_skipped, 1);
    assert_eq!(metrics.pages_scraped, 1);
    assert_eq!(metrics.stop_reason, Some(StopReason::MaxPagesReached));
    assert_eq!(harness.products.len(), 2);
    assert_eq!(harness.probe.close_calls(), 1);

    let saved = harness
        .products
        .find_by_url("https://www.terabyteshop.com.br/produto/2/rx-7600")
        .await
        .unwrap()
        .expect("product persisted");
    assert_eq!(saved.product.chip_brand, ChipBrand::Amd);
    assert_eq!(saved.product.manufacturer, "XFX");
    assert_eq!(saved.product.store, Store::Terabyte);
    assert_eq!(saved.product.price.amount, 1599.0);
}

/// 测试第2页出现验证码时立即停止，不会访问第3页
#[tokio::test]
async fn test_captcha_on_second_page_stops_the_loop() {
    let mut pages = terabyte_site(10);
    pages.insert(page_url("terabyte", 2), SnapshotPage::Html(challenge_page()));
    let harness = create_harness(pages, None);

    let metrics = harness
        .use_case
        .execute("terabyte", &test_config(10), &CancellationToken::new())
        .await;

    assert_eq!(metrics.pages_scraped, 1);
    assert_eq!(metrics.captchas_detected, 1);
    assert_eq!(metrics.stop_reason, Some(StopReason::CaptchaDetected));
    // Page 1 still produced products, so the run is a partial success
    assert!(metrics.success);
    assert!(!harness.probe.visited().contains(&page_url("terabyte", 3)));
    assert_eq!(harness.probe.close_calls(), 1);
}

/// 测试验证码出现在第一页时运行失败
#[tokio::test]
async fn test_captcha_on_first_page_fails_the_run() {
    let mut pages = HashMap::new();
    pages.insert(page_url("kabum", 1), SnapshotPage::Html(challenge_page()));
    let harness = create_harness(pages, None);

    let metrics = harness
        .use_case
        .execute("kabum", &test_config(5), &CancellationToken::new())
        .await;

    assert!(!metrics.success);
    assert_eq!(metrics.captchas_detected, 1);
    assert_eq!(metrics.pages_scraped, 0);
    assert!(metrics.error_message.is_some());
}

/// 测试连续三次页面加载失败后停止
#[tokio::test]
async fn test_three_consecutive_load_failures_stop_the_crawl() {
    let mut pages = terabyte_site(1);
    for page in 2..=4 {
        pages.insert(
            page_url("terabyte", page),
            SnapshotPage::Unreachable("net::ERR_CONNECTION_RESET".to_string()),
        );
    }
    let harness = create_harness(pages, None);

    let metrics = harness
        .use_case
        .execute("terabyte", &test_config(10), &CancellationToken::new())
        .await;

    assert_eq!(metrics.errors, 3);
    assert_eq!(metrics.pages_scraped, 1);
    assert_eq!(metrics.products_saved, 3);
    assert_eq!(metrics.stop_reason, Some(StopReason::ConsecutiveLoadFailures));
    assert_eq!(harness.probe.visited().len(), 4);
    assert_eq!(harness.runs.all().len(), 1);
}

/// 测试所有页面都无法加载时，运行以失败结束但不会抛出
#[tokio::test]
async fn test_unreachable_store_finishes_as_failure() {
    let harness = create_harness(HashMap::new(), None);

    let metrics = harness
        .use_case
        .execute("kabum", &test_config(10), &CancellationToken::new())
        .await;

    assert!(!metrics.success);
    assert_eq!(metrics.products_found, 0);
    assert_eq!(metrics.errors, 3);
    assert!(metrics.error_message.is_some());
    assert!(metrics.finished_at.is_some());
}

/// 测试导航重试：每个失败页面尝试多次，但只记一次错误
#[tokio::test]
async fn test_navigation_retries_count_one_error_per_page() {
    let mut pages = terabyte_site(10);
    for page in [2, 3, 4] {
        pages.remove(&page_url("terabyte", page));
    }
    let harness = create_harness(pages, None);
    let mut config = test_config(10);
    config.navigation_attempts = 3;
    config.retry_base_delay_ms = 1;
    config.consecutive_failure_limit = 3;
    config.error_threshold = 5;

    let metrics = harness
        .use_case
        .execute("terabyte", &config, &CancellationToken::new())
        .await;

    assert_eq!(metrics.pages_scraped, 1);
    assert_eq!(metrics.errors, 3);
    assert_eq!(metrics.products_saved, 3);
    assert_eq!(metrics.stop_reason, Some(StopReason::ConsecutiveLoadFailures));
    assert!(metrics.success);

    let visited = harness.probe.visited();
    assert_eq!(visited.len(), 10);
    assert_eq!(visited.iter().filter(|u| **u == page_url("terabyte", 1)).count(), 1);
    for page in [2, 3, 4] {
        let url = page_url("terabyte", page);
        assert_eq!(visited.iter().filter(|u| **u == url).count(), 3);
    }
    assert!(!visited.contains(&page_url("terabyte", 5)));
}

/// 测试零散的加载失败不会终止运行，直到累计错误达到阈值
#[tokio::test]
async fn test_scattered_failures_reach_error_threshold() {
    let mut pages = terabyte_site(10);
    for page in [2, 4, 6] {
        pages.remove(&page_url("terabyte", page));
    }
    let harness = create_harness(pages, None);

    let metrics = harness
        .use_case
        .execute("terabyte", &test_config(10), &CancellationToken::new())
        .await;

    assert_eq!(metrics.errors, 3);
    assert_eq!(metrics.pages_scraped, 3);
    assert_eq!(metrics.stop_reason, Some(StopReason::ErrorThreshold));
    assert!(metrics.success);
}

/// 测试第5页发生 panic 时会话仍然只关闭一次
#[tokio::test]
async fn test_panic_on_page_five_still_closes_session_once() {
    let harness = create_harness(
        terabyte_site(10),
        Some(Fault::PanicOn(page_url("terabyte", 5))),
    );

    let metrics = harness
        .use_case
        .execute("terabyte", &test_config(10), &CancellationToken::new())
        .await;

    assert!(!metrics.success);
    assert_eq!(metrics.stop_reason, Some(StopReason::UnexpectedError));
    assert_eq!(metrics.pages_scraped, 4);
    assert_eq!(metrics.errors, 1);
    assert!(metrics
        .error_message
        .as_deref()
        .is_some_and(|m| m.contains("renderer crashed")));
    assert_eq!(harness.probe.close_calls(), 1);
    assert_eq!(harness.runs.all().len(), 1);
}

/// 测试页面检查中的未分类错误会停止循环
#[tokio::test]
async fn test_unclassified_page_error_stops_the_loop() {
    let harness = create_harness(
        terabyte_site(5),
        Some(Fault::TitleErrorOn(page_url("terabyte", 2))),
    );

    let metrics = harness
        .use_case
        .execute("terabyte", &test_config(5), &CancellationToken::new())
        .await;

    assert!(!metrics.success);
    assert_eq!(metrics.stop_reason, Some(StopReason::UnexpectedError));
    assert_eq!(metrics.pages_scraped, 1);
    assert_eq!(metrics.errors, 1);
    assert!(!harness.probe.visited().contains(&page_url("terabyte", 3)));
    assert_eq!(harness.probe.close_calls(), 1);
}

/// 测试会话初始化失败是致命错误
#[tokio::test]
async fn test_session_init_failure_is_fatal() {
    let harness = create_harness(terabyte_site(3), Some(Fault::InitFailure));

    let metrics = harness
        .use_case
        .execute("terabyte", &test_config(3), &CancellationToken::new())
        .await;

    assert!(!metrics.success);
    assert_eq!(metrics.errors, 1);
    assert_eq!(metrics.stop_reason, Some(StopReason::SessionInitFailed));
    assert!(metrics
        .error_message
        .as_deref()
        .is_some_and(|m| m.contains("chrome not found")));
    assert!(harness.probe.visited().is_empty());
    assert_eq!(harness.probe.close_calls(), 1);
    assert_eq!(harness.runs.all().len(), 1);
}

/// 测试维护页按页面加载失败处理
#[tokio::test]
async fn test_maintenance_page_counts_as_load_error() {
    let listing = r#"<html><head><title>Placa de Vídeo | Pichau</title></head><body>
        <a href="/placa-de-video-galax-geforce-rtx-4060-1-click-oc">
          <div class="MuiCard-root">
            <h2>Placa de Video Galax GeForce RTX 4060 1-Click OC</h2>
            <div class="jss-price"><span>à vista R$ 1.899,99</span></div>
          </div>
        </a></body></html>"#;

    let mut pages = HashMap::new();
    pages.insert(
        page_url("pichau", 1),
        SnapshotPage::Html(maintenance_page("Site em Manutenção | Pichau")),
    );
    pages.insert(page_url("pichau", 2), SnapshotPage::Html(listing.to_string()));
    let harness = create_harness(pages, None);

    let metrics = harness
        .use_case
        .execute("pichau", &test_config(2), &CancellationToken::new())
        .await;

    assert!(metrics.success);
    assert_eq!(metrics.errors, 1);
    assert_eq!(metrics.pages_scraped, 1);
    assert_eq!(metrics.products_saved, 1);
    assert_eq!(metrics.stop_reason, Some(StopReason::MaxPagesReached));

    let saved = harness
        .products
        .find_by_url("https://www.pichau.com.br/placa-de-video-galax-geforce-rtx-4060-1-click-oc")
        .await
        .unwrap()
        .expect("product persisted");
    assert_eq!(saved.product.price.amount, 1899.99);
    assert_eq!(saved.product.chip_brand, ChipBrand::Nvidia);
}

/// 测试缺货商品会被保存并计入缺货数
#[tokio::test]
async fn test_sold_out_products_are_saved_as_unavailable() {
    let html = terabyte_page(&[
        Card::new("Placa de Vídeo PNY GeForce RTX 4080 Super Verto", "R$ 7.499,90", "/produto/9/rtx-4080"),
        Card::new("Placa de Vídeo PowerColor Hellhound RX 7900 XTX", "R$ 6.999,00", "/produto/8/rx-7900-xtx")
            .sold_out(),
    ]);
    let mut pages = HashMap::new();
    pages.insert(page_url("terabyte", 1), SnapshotPage::Html(html));
    let harness = create_harness(pages, None);

    let metrics = harness
        .use_case
        .execute("terabyte", &test_config(1), &CancellationToken::new())
        .await;

    assert_eq!(metrics.products_saved, 2);
    assert_eq!(metrics.unavailable_count, 1);

    let sold_out = harness
        .products
        .find_by_url("https://www.terabyteshop.com.br/produto/8/rx-7900-xtx")
        .await
        .unwrap()
        .expect("product persisted");
    assert!(!sold_out.product.available);
    assert_eq!(sold_out.product.model, "RX 7900 XTX");
}

/// 测试同一店铺抓取两次不会产生重复商品
#[tokio::test]
async fn test_repeated_runs_upsert_by_url() {
    let harness = create_harness(terabyte_site(2), None);
    let cancel = CancellationToken::new();

    let first = harness.use_case.execute("terabyte", &test_config(2), &cancel).await;
    let second = harness.use_case.execute("terabyte", &test_config(2), &cancel).await;

    assert_eq!(first.products_saved, 6);
    assert_eq!(second.products_saved, 6);
    assert_eq!(harness.products.len(), 6);
    assert_eq!(harness.runs.all().len(), 2);
    assert_eq!(harness.probe.created(), 2);
    assert_eq!(harness.probe.close_calls(), 2);
}

/// 测试商品卡片过少时保存快照，且页面不计入商品
#[tokio::test]
async fn test_sparse_page_writes_debug_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let mut pages = HashMap::new();
    pages.insert(page_url("terabyte", 1), SnapshotPage::Html(terabyte_listing(1)));

    let mut harness = create_harness(pages, None);
    let snapshots = SnapshotStore::new(dir.path());
    harness.use_case = harness.use_case.with_snapshot_store(Some(snapshots.clone()));

    // Default config expects at least six cards
    let config = ScrapeConfig::default().with_max_pages(1);
    let metrics = harness
        .use_case
        .execute("terabyte", &config, &CancellationToken::new())
        .await;

    assert!(metrics.success);
    assert_eq!(metrics.products_found, 0);
    assert_eq!(metrics.pages_scraped, 1);
    assert!(harness.products.is_empty());

    let snapshot = snapshots.path_for(Store::Terabyte, &page_url("terabyte", 1));
    let html = tokio::fs::read_to_string(snapshot).await.unwrap();
    assert!(html.contains("product-item"));
}

/// 测试外部取消会中断挂起的导航并释放会话
#[tokio::test]
async fn test_cancellation_releases_session() {
    let harness = create_harness(
        terabyte_site(5),
        Some(Fault::HangOn(page_url("terabyte", 2))),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let metrics = harness
        .use_case
        .execute("terabyte", &test_config(5), &cancel)
        .await;

    assert!(!metrics.success);
    assert_eq!(metrics.stop_reason, Some(StopReason::Cancelled));
    assert_eq!(metrics.pages_scraped, 1);
    assert_eq!(harness.probe.close_calls(), 1);
    assert_eq!(harness.runs.all().len(), 1);
}

/// 测试未知商店直接返回失败结果
#[tokio::test]
async fn test_unknown_store_returns_failed_metrics() {
    let harness = create_harness(HashMap::new(), None);

    let metrics = harness
        .use_case
        .execute("mercadolivre", &test_config(1), &CancellationToken::new())
        .await;

    assert!(!metrics.success);
    assert!(metrics.run_id.is_none());
    assert_eq!(harness.probe.created(), 0);
    assert!(harness.runs.all().is_empty());
}
