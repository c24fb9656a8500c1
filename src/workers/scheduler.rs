// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::application::dto::run_metrics::RunMetrics;
use crate::application::use_cases::scrape_store::ScrapeStoreUseCase;
use crate::config::settings::SchedulerSettings;
use crate::domain::models::scrape_config::ScrapeConfig;
use crate::domain::repositories::product_repository::ProductRepository;
use crate::domain::repositories::scrape_run_repository::ScrapeRunRepository;

/// 定时抓取调度器
///
/// 进程启动时显式创建，收到取消信号后退出。一轮调度按顺序抓取配置的商店，
/// 避免多个会话共用出口IP触发限流
pub struct ScrapeScheduler<PR, RR>
where
    PR: ProductRepository + 'static,
    RR: ScrapeRunRepository + 'static,
{
    use_case: Arc<ScrapeStoreUseCase<PR, RR>>,
    product_repo: Arc<PR>,
    config: ScrapeConfig,
    settings: SchedulerSettings,
    permits: Arc<Semaphore>,
}

impl<PR, RR> ScrapeScheduler<PR, RR>
where
    PR: ProductRepository + 'static,
    RR: ScrapeRunRepository + 'static,
{
    pub fn new(
        use_case: Arc<ScrapeStoreUseCase<PR, RR>>,
        product_repo: Arc<PR>,
        config: ScrapeConfig,
        settings: SchedulerSettings,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(settings.max_concurrent.max(1)));
        Self {
            use_case,
            product_repo,
            config,
            settings,
            permits,
        }
    }

    /// 运行调度器直到取消
    ///
    /// `run_once` 时只执行一轮
    pub async fn run(&self, cancel: CancellationToken) {
        if self.settings.run_once {
            info!("Running a single scrape cycle");
            self.run_cycle(&cancel).await;
            return;
        }

        let period = Duration::from_secs(self.settings.interval_minutes.max(1) * 60);
        info!(
            interval_minutes = self.settings.interval_minutes,
            stores = ?self.settings.stores,
            "Scrape scheduler started"
        );

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately
        ticker.tick().await;

        if self.settings.run_on_startup {
            self.run_cycle(&cancel).await;
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.run_cycle(&cancel).await;
                }
            }
        }

        info!("Scrape scheduler stopped");
    }

    /// 启动后台运行
    pub fn start(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(cancel).await;
        })
    }

    /// 依次抓取所有配置的商店
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> Vec<RunMetrics> {
        let mut results = Vec::with_capacity(self.settings.stores.len());

        for store in &self.settings.stores {
            if cancel.is_cancelled() {
                warn!("Scrape cycle interrupted by shutdown");
                break;
            }
            let metrics = self.run_store(store, cancel).await;
            results.push(metrics);
        }

        let saved: u32 = results.iter().map(|m| m.products_saved).sum();
        let succeeded = results.iter().filter(|m| m.success).count();
        info!(runs = results.len(), succeeded, saved, "Scrape cycle finished");
        self.log_product_stats().await;

        results
    }

    /// 立即抓取一个商店，受并发上限约束
    pub async fn trigger(&self, store_id: &str, cancel: &CancellationToken) -> RunMetrics {
        self.run_store(store_id, cancel).await
    }

    async fn run_store(&self, store_id: &str, cancel: &CancellationToken) -> RunMetrics {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(e) => return RunMetrics::rejected(store_id, e.to_string()),
        };
        self.use_case.execute(store_id, &self.config, cancel).await
    }

    async fn log_product_stats(&self) {
        match self.product_repo.stats().await {
            Ok(stats) => info!(
                total = stats.total,
                available = stats.available,
                by_store = ?stats.by_store,
                by_chip = ?stats.by_chip_brand,
                average_price = ?stats.average_price,
                "Product statistics"
            ),
            Err(e) => error!("Failed to load product statistics: {}", e),
        }
    }
}
