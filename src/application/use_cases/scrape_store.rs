// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use futures::FutureExt;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

use crate::application::dto::run_metrics::RunMetrics;
use crate::config::settings::DetectionSettings;
use crate::domain::models::product::{EnrichedProduct, Store};
use crate::domain::models::scrape_config::ScrapeConfig;
use crate::domain::models::scrape_run::{ScrapeRun, StopReason};
use crate::domain::repositories::product_repository::ProductRepository;
use crate::domain::repositories::scrape_run_repository::ScrapeRunRepository;
use crate::domain::services::page_inspector::PageInspector;
use crate::domain::services::price_parser::PriceParser;
use crate::domain::services::product_enricher::ProductEnricher;
use crate::engines::traits::{BrowserSession, ElementHandle, SessionFactory, SessionOptions};
use crate::infrastructure::metrics;
use crate::infrastructure::storage::SnapshotStore;
use crate::scrapers::registry::ScraperRegistry;
use crate::scrapers::selectors::FieldExtractor;
use crate::scrapers::traits::StoreCrawler;
use crate::utils::errors::ScrapeError;
use crate::utils::humanize::Humanizer;
use crate::utils::retry_policy::RetryPolicy;

static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

const SNIPPET_CHARS: usize = 300;

// === Section: Run State ===

/// 一次运行经历的状态，只用于日志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Initializing,
    CrawlingPage(u32),
    Extracting(u32),
    DecidingContinuation(u32),
    Finalizing,
    Finished { success: bool },
}

/// 抓取循环的结束方式
#[derive(Debug)]
enum LoopEnd {
    /// 循环按策略停止，成功与否由已保存的商品决定
    Stopped(StopReason),
    /// 循环被异常或取消打断
    Aborted { reason: StopReason, message: String },
}

/// 单页的处理结果
#[derive(Debug)]
enum PageOutcome {
    Scraped,
    Challenge(String),
}

/// 单个商品卡片的处理结果
#[derive(Debug)]
enum CardOutcome {
    Saved { available: bool },
    Skipped(String),
}

// === Section: Use Case Definition ===

/// 单个商店的抓取用例
///
/// 持有抓取所需的全部协作者。每次运行都从工厂拿到一个独占的浏览器会话，
/// 并保证在任何退出路径上恰好关闭一次
pub struct ScrapeStoreUseCase<PR, RR>
where
    PR: ProductRepository,
    RR: ScrapeRunRepository,
{
    product_repo: Arc<PR>,
    run_repo: Arc<RR>,
    registry: ScraperRegistry,
    session_factory: Arc<dyn SessionFactory>,
    enricher: ProductEnricher,
    inspector: PageInspector,
    humanizer: Humanizer,
    session_options: SessionOptions,
    snapshot_store: Option<SnapshotStore>,
}

// === Section: Implementation ===

impl<PR, RR> ScrapeStoreUseCase<PR, RR>
where
    PR: ProductRepository + 'static,
    RR: ScrapeRunRepository + 'static,
{
    /// 创建新的抓取用例实例
    ///
    /// 默认不做人类行为模拟，也不保存调试快照
    pub fn new(
        product_repo: Arc<PR>,
        run_repo: Arc<RR>,
        registry: ScraperRegistry,
        session_factory: Arc<dyn SessionFactory>,
        detection: &DetectionSettings,
    ) -> Self {
        Self {
            product_repo,
            run_repo,
            registry,
            session_factory,
            enricher: ProductEnricher::new(),
            inspector: PageInspector::new(detection),
            humanizer: Humanizer::disabled(),
            session_options: SessionOptions::default(),
            snapshot_store: None,
        }
    }

    pub fn with_humanizer(mut self, humanizer: Humanizer) -> Self {
        self.humanizer = humanizer;
        self
    }

    /// 会话的基础参数；无头模式、超时和请求头在每次运行时覆盖
    pub fn with_session_options(mut self, options: SessionOptions) -> Self {
        self.session_options = options;
        self
    }

    pub fn with_snapshot_store(mut self, store: Option<SnapshotStore>) -> Self {
        self.snapshot_store = store;
        self
    }

    /// 执行一次商店抓取
    ///
    /// # 参数
    ///
    /// * `store_id` - 商店标识，如 `kabum`
    /// * `config` - 本次运行的参数
    /// * `cancel` - 外部停止信号
    ///
    /// # 返回值
    ///
    /// 总是返回运行结果，失败以 `success = false` 和错误信息表达
    pub async fn execute(
        &self,
        store_id: &str,
        config: &ScrapeConfig,
        cancel: &CancellationToken,
    ) -> RunMetrics {
        if let Err(e) = config.validate() {
            let err = ScrapeError::InvalidConfig(e.to_string());
            warn!(store = %store_id, error = %err, "scrape_request_rejected");
            return RunMetrics::rejected(store_id, err.to_string());
        }

        let crawler = match self.registry.create(store_id) {
            Ok(crawler) => crawler,
            Err(err) => {
                warn!(store = %store_id, error = %err, "scrape_request_rejected");
                return RunMetrics::rejected(store_id, err.to_string());
            }
        };

        let run = self.run(crawler, config, cancel).await;
        RunMetrics::from(&run)
    }

    /// 驱动一次完整的运行并返回已结束、已保存的 [`ScrapeRun`]
    #[instrument(skip_all, fields(store = %crawler.store()))]
    pub async fn run(
        &self,
        crawler: Arc<dyn StoreCrawler>,
        config: &ScrapeConfig,
        cancel: &CancellationToken,
    ) -> ScrapeRun {
        let mut run = ScrapeRun::start(crawler.store());
        info!(
            run_id = %run.id(),
            engine = self.session_factory.name(),
            max_pages = config.max_pages,
            "scrape_run_started"
        );

        let mut session = self.session_factory.create();
        self.transition(&run, RunState::Initializing);

        let options = self.session_options_for(crawler.as_ref(), config);
        let init = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = session.initialize(&options) => Some(result),
        };

        match init {
            None => {
                run.finish_with_error(StopReason::Cancelled, "run cancelled before the session was ready");
            }
            Some(Err(e)) => {
                let err = ScrapeError::SessionInit(e);
                error!(run_id = %run.id(), error = %err, "session_init_failed");
                run.record_error();
                run.finish_with_error(StopReason::SessionInitFailed, err.to_string());
            }
            Some(Ok(())) => {
                let end = AssertUnwindSafe(self.crawl_pages(
                    crawler.as_ref(),
                    session.as_mut(),
                    config,
                    cancel,
                    &mut run,
                ))
                .catch_unwind()
                .await;
                Self::conclude(&mut run, end);
            }
        }

        self.transition(&run, RunState::Finalizing);
        if let Err(e) = session.close().await {
            warn!(run_id = %run.id(), error = %e, "session_close_failed");
        }

        metrics::record_run(&run);
        if let Err(e) = self.run_repo.save(&run).await {
            error!(run_id = %run.id(), error = %e, "scrape_run_save_failed");
        }

        let counters = run.counters();
        info!(
            run_id = %run.id(),
            success = run.is_success(),
            stop_reason = ?run.stop_reason(),
            pages = counters.pages_scraped,
            found = counters.products_found,
            saved = counters.products_saved,
            skipped = counters.products_skipped,
            errors = counters.errors,
            captchas = counters.captchas_detected,
            "scrape_run_finished"
        );
        self.transition(
            &run,
            RunState::Finished {
                success: run.is_success(),
            },
        );
        run
    }

    fn session_options_for(&self, crawler: &dyn StoreCrawler, config: &ScrapeConfig) -> SessionOptions {
        let mut options = self.session_options.clone();
        options.headless = config.headless;
        options.timeout = Duration::from_millis(config.timeout_ms);
        options.extra_headers.extend(
            crawler
                .extra_headers()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        options
    }

    fn conclude(run: &mut ScrapeRun, end: Result<LoopEnd, Box<dyn Any + Send>>) {
        match end {
            Ok(LoopEnd::Stopped(reason)) => {
                if reason.is_early_stop() && run.counters().products_saved == 0 {
                    run.finish_with_error(reason, format!("stopped early ({}) without saving any product", reason));
                } else {
                    run.finish_successfully(reason);
                }
            }
            Ok(LoopEnd::Aborted { reason, message }) => {
                run.finish_with_error(reason, message);
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(run_id = %run.id(), panic = %message, "scrape_loop_panicked");
                run.record_error();
                run.finish_with_error(StopReason::UnexpectedError, message);
            }
        }
    }

    fn transition(&self, run: &ScrapeRun, state: RunState) {
        debug!(run_id = %run.id(), state = ?state, "run_state");
    }

    // === Section: Page Loop ===

    async fn crawl_pages(
        &self,
        crawler: &dyn StoreCrawler,
        session: &mut dyn BrowserSession,
        config: &ScrapeConfig,
        cancel: &CancellationToken,
        run: &mut ScrapeRun,
    ) -> LoopEnd {
        let mut page = 1u32;
        let mut consecutive_failures = 0u32;

        loop {
            if cancel.is_cancelled() {
                return cancelled();
            }
            self.transition(run, RunState::CrawlingPage(page));

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return cancelled(),
                outcome = self.process_page(crawler, session, config, page, run) => outcome,
            };

            match outcome {
                Ok(PageOutcome::Scraped) => {
                    consecutive_failures = 0;
                }
                Ok(PageOutcome::Challenge(marker)) => {
                    run.record_captcha();
                    warn!(
                        run_id = %run.id(),
                        page,
                        marker = %marker,
                        "captcha_detected_stopping"
                    );
                    return LoopEnd::Stopped(StopReason::CaptchaDetected);
                }
                Err(e) if e.is_page_load() => {
                    run.record_error();
                    consecutive_failures += 1;
                    warn!(
                        run_id = %run.id(),
                        page,
                        consecutive = consecutive_failures,
                        error = %e,
                        "page_load_failed"
                    );
                    if consecutive_failures >= config.consecutive_failure_limit {
                        warn!(run_id = %run.id(), page, "too_many_consecutive_failures");
                        return LoopEnd::Stopped(StopReason::ConsecutiveLoadFailures);
                    }
                }
                Err(e) => {
                    run.record_error();
                    error!(run_id = %run.id(), page, error = %e, "unexpected_page_error");
                    return LoopEnd::Aborted {
                        reason: StopReason::UnexpectedError,
                        message: e.to_string(),
                    };
                }
            }

            self.transition(run, RunState::DecidingContinuation(page));
            if run.counters().errors >= config.error_threshold {
                warn!(run_id = %run.id(), errors = run.counters().errors, "error_threshold_reached");
                return LoopEnd::Stopped(StopReason::ErrorThreshold);
            }
            if page >= config.max_pages {
                info!(run_id = %run.id(), page, "max_pages_reached");
                return LoopEnd::Stopped(StopReason::MaxPagesReached);
            }
            page += 1;
        }
    }

    /// 处理一个列表页：导航、检测、提取并保存
    async fn process_page(
        &self,
        crawler: &dyn StoreCrawler,
        session: &mut dyn BrowserSession,
        config: &ScrapeConfig,
        page: u32,
        run: &mut ScrapeRun,
    ) -> Result<PageOutcome, ScrapeError> {
        let url = crawler.page_url(page);
        self.humanizer.page_delay().await;

        info!(run_id = %run.id(), page, url = %url, "navigating");
        self.navigate_with_retry(session, &url, config).await?;

        self.humanizer.simulate(session).await;
        crawler.after_navigation(session, &self.humanizer).await;

        let title = session
            .title()
            .await
            .map_err(|e| ScrapeError::Extraction(format!("reading title of {}: {}", url, e)))?;
        let html = session
            .content()
            .await
            .map_err(|e| ScrapeError::Extraction(format!("reading content of {}: {}", url, e)))?;

        if let Some(signal) = self.inspector.detect_challenge(&title, &html) {
            return Ok(PageOutcome::Challenge(signal.marker().to_string()));
        }

        if let Some(phrase) = self
            .inspector
            .detect_maintenance(&title, crawler.maintenance_markers())
        {
            return Err(ScrapeError::page_load(
                url,
                format!("store is under maintenance ({})", phrase),
            ));
        }

        self.transition(run, RunState::Extracting(page));
        let cards = self.find_cards(crawler, session, config).await;
        if cards.len() < config.min_product_cards {
            self.report_sparse_page(crawler.store(), &url, &title, &html, cards.len(), config)
                .await;
            run.record_page();
            return Ok(PageOutcome::Scraped);
        }

        run.record_products_found(cards.len() as u32);
        info!(run_id = %run.id(), page, cards = cards.len(), "product_cards_found");

        let parser = PriceParser::new(config.price_bounds());
        let mut extractor = FieldExtractor::new(session);
        for card in cards {
            let outcome = AssertUnwindSafe(self.process_card(crawler, &mut extractor, card, &parser))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(CardOutcome::Saved { available })) => {
                    run.record_saved();
                    if !available {
                        run.record_unavailable();
                    }
                }
                Ok(Ok(CardOutcome::Skipped(reason))) => {
                    debug!(run_id = %run.id(), page, reason = %reason, "product_skipped");
                    run.record_skipped();
                }
                Ok(Err(e)) => {
                    warn!(run_id = %run.id(), page, error = %e, "product_processing_failed");
                    run.record_skipped();
                }
                Err(panic) => {
                    warn!(
                        run_id = %run.id(),
                        page,
                        panic = %panic_message(panic.as_ref()),
                        "product_processing_panicked"
                    );
                    run.record_skipped();
                }
            }
        }

        run.record_page();
        Ok(PageOutcome::Scraped)
    }

    async fn navigate_with_retry(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
        config: &ScrapeConfig,
    ) -> Result<(), ScrapeError> {
        let policy = RetryPolicy::navigation(config.navigation_attempts, config.retry_base_delay_ms);
        let timeout = Duration::from_millis(config.timeout_ms);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match session.navigate(url, timeout).await {
                Ok(()) => return Ok(()),
                Err(e) if policy.should_retry_with_error(attempt, &e) => {
                    let backoff = policy.calculate_backoff(attempt);
                    warn!(url = %url, attempt, backoff_ms = backoff.as_millis() as u64, error = %e, "navigation_retry");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) if attempt > 1 => {
                    return Err(ScrapeError::MaxRetriesExceeded {
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => return Err(ScrapeError::page_load(url, e)),
            }
        }
    }

    /// 按顺序尝试商品卡片选择器，第一个达到最小数量的获胜
    async fn find_cards(
        &self,
        crawler: &dyn StoreCrawler,
        session: &mut dyn BrowserSession,
        config: &ScrapeConfig,
    ) -> Vec<ElementHandle> {
        let mut best: Vec<ElementHandle> = Vec::new();

        for selector in crawler.selectors().product_card.iter() {
            match session.find_elements(selector).await {
                Ok(handles) if handles.len() >= config.min_product_cards => {
                    debug!(selector = %selector, count = handles.len(), "product_card_selector_matched");
                    return handles;
                }
                Ok(handles) => {
                    debug!(selector = %selector, count = handles.len(), "product_card_selector_sparse");
                    if handles.len() > best.len() {
                        best = handles;
                    }
                }
                Err(e) => debug!(selector = %selector, error = %e, "product_card_selector_failed"),
            }
        }
        best
    }

    async fn process_card(
        &self,
        crawler: &dyn StoreCrawler,
        extractor: &mut FieldExtractor<'_>,
        card: ElementHandle,
        parser: &PriceParser,
    ) -> Result<CardOutcome, ScrapeError> {
        let record = crawler
            .extract_record(extractor, card, self.inspector.unavailable_keywords())
            .await;

        let valid = match record.validate(parser) {
            Ok(valid) => valid,
            Err(failure) => return Ok(CardOutcome::Skipped(failure.to_string())),
        };

        let enrichment = self.enricher.enrich(&valid.title, &valid.url);
        let product = EnrichedProduct {
            title: valid.title,
            price: valid.price,
            url: valid.url,
            store: crawler.store(),
            chip_brand: enrichment.chip_brand,
            manufacturer: enrichment.manufacturer,
            model: enrichment.model,
            available: valid.available,
            scraped_at: Utc::now(),
        };

        let id = self.product_repo.upsert(&product).await?;
        debug!(product_id = %id, url = %product.url, price = product.price.amount, "product_saved");
        Ok(CardOutcome::Saved {
            available: product.available,
        })
    }

    /// 记录商品过少的页面，方便离线排查选择器
    async fn report_sparse_page(
        &self,
        store: Store,
        url: &str,
        title: &str,
        html: &str,
        found: usize,
        config: &ScrapeConfig,
    ) {
        warn!(
            store = %store,
            url = %url,
            title = %title,
            found,
            expected = config.min_product_cards,
            html_len = html.len(),
            body = %body_snippet(html),
            "too_few_product_cards"
        );

        if let Some(snapshots) = &self.snapshot_store {
            match snapshots.save(store, url, html).await {
                Ok(path) => info!(path = %path.display(), "page_snapshot_saved"),
                Err(e) => warn!(error = %e, "page_snapshot_failed"),
            }
        }
    }
}

fn cancelled() -> LoopEnd {
    LoopEnd::Aborted {
        reason: StopReason::Cancelled,
        message: "run cancelled".to_string(),
    }
}

fn body_snippet(html: &str) -> String {
    let document = Html::parse_document(html);
    let text = document
        .select(&BODY_SELECTOR)
        .next()
        .map(|body| body.text().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(SNIPPET_CHARS)
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic with non-string payload".to_string()
    }
}
