// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::config::settings::MetricsSettings;
use crate::domain::models::scrape_run::ScrapeRun;

/// 初始化 Prometheus 导出器
///
/// 地址无效或端口被占用时只记录警告，抓取照常进行
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!(addr = %settings.listen_addr, error = %e, "invalid_metrics_address");
            return;
        }
    };

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_counter!("scrape_runs_total", "Finished scrape runs by store and outcome");
    describe_counter!("scrape_products_saved_total", "Products persisted by scrape runs");
    describe_counter!("scrape_products_skipped_total", "Product cards rejected during extraction");
    describe_counter!("scrape_captchas_total", "Bot challenges that stopped a run");
    describe_counter!("scrape_page_errors_total", "Page load errors during scrape runs");
    describe_histogram!("scrape_run_duration_seconds", "Duration of scrape runs in seconds");

    info!("Metrics exporter listening on {}", addr);
}

/// 记录一次已结束运行的指标
pub fn record_run(run: &ScrapeRun) {
    let store = run.store().id();
    let outcome = if run.is_success() { "success" } else { "failure" };
    let counters = run.counters();

    counter!("scrape_runs_total", "store" => store, "outcome" => outcome).increment(1);
    counter!("scrape_products_saved_total", "store" => store)
        .increment(u64::from(counters.products_saved));
    counter!("scrape_products_skipped_total", "store" => store)
        .increment(u64::from(counters.products_skipped));
    counter!("scrape_captchas_total", "store" => store)
        .increment(u64::from(counters.captchas_detected));
    counter!("scrape_page_errors_total", "store" => store).increment(u64::from(counters.errors));

    if let Some(elapsed) = run.execution_time() {
        histogram!("scrape_run_duration_seconds", "store" => store).record(elapsed.as_secs_f64());
    }
}
