// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Context;
use gpuscout::application::use_cases::scrape_store::ScrapeStoreUseCase;
use gpuscout::config::settings::{BrowserEngine, BrowserSettings, Settings};
use gpuscout::domain::models::scrape_config::ScrapeConfig;
use gpuscout::engines::chromium_session::ChromiumSessionFactory;
use gpuscout::engines::snapshot_session::{SnapshotSession, SnapshotSessionFactory};
use gpuscout::engines::traits::{SessionFactory, SessionOptions, Viewport};
use gpuscout::infrastructure::database::connection;
use gpuscout::infrastructure::metrics;
use gpuscout::infrastructure::repositories::product_repo_impl::ProductRepoImpl;
use gpuscout::infrastructure::repositories::scrape_run_repo_impl::ScrapeRunRepoImpl;
use gpuscout::infrastructure::storage::SnapshotStore;
use gpuscout::scrapers::registry::ScraperRegistry;
use gpuscout::utils::humanize::Humanizer;
use gpuscout::utils::telemetry;
use gpuscout::workers::ScrapeScheduler;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动调度器
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting gpuscout...");

    // 2. Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    info!("Configuration loaded");

    metrics::init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = connection::connect_and_migrate(&settings.database)
        .await
        .context("failed to connect to the database")?;
    let db = Arc::new(db);
    info!("Database connection established");

    let product_repo = Arc::new(ProductRepoImpl::new(db.clone()));
    let run_repo = Arc::new(ScrapeRunRepoImpl::new(db.clone()));

    // 4. Browser sessions
    let session_factory = build_session_factory(&settings.browser).await?;
    info!(engine = session_factory.name(), "Browser engine selected");

    let config = ScrapeConfig::from(&settings.scraper);
    let snapshot_store = settings
        .scraper
        .debug_snapshot_dir
        .as_ref()
        .map(SnapshotStore::new);

    let use_case = Arc::new(
        ScrapeStoreUseCase::new(
            product_repo.clone(),
            run_repo,
            ScraperRegistry::with_defaults(),
            session_factory,
            &settings.detection,
        )
        .with_humanizer(Humanizer::new(settings.humanize.clone()))
        .with_session_options(session_options(&settings.browser, &config))
        .with_snapshot_store(snapshot_store),
    );

    // 5. Shutdown signal
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
        }
        shutdown.cancel();
    });

    if !settings.scheduler.enabled && !settings.scheduler.run_once {
        info!("Scheduler disabled, nothing to do");
        return Ok(());
    }

    // 6. Run the scheduler until shutdown
    let scheduler = ScrapeScheduler::new(use_case, product_repo, config, settings.scheduler.clone());
    scheduler.run(cancel).await;

    info!("gpuscout stopped");
    Ok(())
}

async fn build_session_factory(browser: &BrowserSettings) -> anyhow::Result<Arc<dyn SessionFactory>> {
    match browser.engine {
        BrowserEngine::Chromium => Ok(Arc::new(ChromiumSessionFactory::new(browser.clone()))),
        BrowserEngine::Snapshot => {
            let pages = SnapshotSession::load_dir(&browser.snapshot_dir)
                .await
                .with_context(|| format!("failed to read snapshots from {}", browser.snapshot_dir))?;
            info!(pages = pages.len(), dir = %browser.snapshot_dir, "Snapshots loaded");
            Ok(Arc::new(SnapshotSessionFactory::new(pages)))
        }
    }
}

fn session_options(browser: &BrowserSettings, config: &ScrapeConfig) -> SessionOptions {
    SessionOptions {
        headless: config.headless,
        user_agent: browser.user_agent.clone(),
        viewport: Some(Viewport {
            width: browser.viewport_width,
            height: browser.viewport_height,
        }),
        locale: Some(browser.locale.clone()),
        timeout: Duration::from_millis(config.timeout_ms),
        ..SessionOptions::default()
    }
}
