// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::element::Element;
use chromiumoxide::handler::viewport::Viewport as CdpViewport;
use chromiumoxide::handler::Handler;
use chromiumoxide::layout::Point;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use rand::seq::IndexedRandom;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::settings::BrowserSettings;
use crate::engines::traits::{
    BrowserSession, ElementHandle, EngineError, SessionFactory, SessionOptions,
};

/// 隐藏自动化特征的启动参数
const STEALTH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--no-first-run",
    "--no-zygote",
    "--hide-scrollbars",
    "--mute-audio",
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-extensions",
    "--disable-features=TranslateUI",
    "--disable-renderer-backgrounding",
    "--force-color-profile=srgb",
    "--metrics-recording-only",
];

/// 每个新文档加载前执行
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'languages', { get: () => ['pt-BR', 'pt', 'en-US', 'en'] });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
window.chrome = window.chrome || { runtime: {} };
"#;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

static ANCHOR_SEQ: AtomicU64 = AtomicU64::new(0);

fn cdp_err(e: impl std::fmt::Display) -> EngineError {
    EngineError::Other(e.to_string())
}

/// 基于 chromiumoxide 的浏览器会话
///
/// 元素句柄是 `elements` 中的下标，每次导航后清空
pub struct ChromiumSession {
    settings: BrowserSettings,
    browser: Option<Browser>,
    handler_task: Option<JoinHandle<()>>,
    page: Option<Page>,
    elements: Vec<Element>,
    closed: bool,
}

impl ChromiumSession {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            browser: None,
            handler_task: None,
            page: None,
            elements: Vec::new(),
            closed: false,
        }
    }

    fn page(&self) -> Result<&Page, EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        self.page.as_ref().ok_or(EngineError::NotInitialized)
    }

    fn element(&self, handle: ElementHandle) -> Result<&Element, EngineError> {
        self.elements
            .get(handle.index())
            .ok_or(EngineError::StaleElement(handle.index()))
    }

    fn register(&mut self, element: Element) -> ElementHandle {
        self.elements.push(element);
        ElementHandle::new(self.elements.len() - 1)
    }

    fn pick_user_agent(&self, options: &SessionOptions) -> Option<String> {
        options
            .user_agent
            .clone()
            .or_else(|| self.settings.user_agent.clone())
            .or_else(|| self.settings.user_agents.choose(&mut rand::rng()).cloned())
    }

    async fn launch(&self, options: &SessionOptions) -> Result<(Browser, Handler), EngineError> {
        if let Some(url) = &self.settings.remote_debugging_url {
            info!("Connecting to remote Chrome instance at: {}", url);
            return Browser::connect(url)
                .await
                .map_err(|e| EngineError::Launch(format!("Failed to connect to remote Chrome: {}", e)));
        }

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(options.timeout);

        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(viewport) = options.viewport {
            builder = builder
                .window_size(viewport.width, viewport.height)
                .viewport(CdpViewport {
                    width: viewport.width,
                    height: viewport.height,
                    ..Default::default()
                });
        }
        if let Some(path) = &self.settings.executable {
            builder = builder.chrome_executable(path);
        }
        if let Some(locale) = &options.locale {
            builder = builder.arg(format!("--lang={}", locale));
        }
        for arg in STEALTH_ARGS {
            builder = builder.arg(*arg);
        }

        Browser::launch(builder.build().map_err(EngineError::Launch)?)
            .await
            .map_err(|e| EngineError::Launch(e.to_string()))
    }

    async fn poll_until<F>(page: Page, selector: &str, timeout: Duration, done: F) -> Result<(), EngineError>
    where
        F: Fn(usize) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            let count = page
                .find_elements(selector)
                .await
                .map(|found| found.len())
                .unwrap_or(0);
            if done(count) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(EngineError::Timeout(timeout));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn initialize(&mut self, options: &SessionOptions) -> Result<(), EngineError> {
        let (browser, mut handler) = self.launch(options).await?;

        // Spawn a handler to process browser events
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });
        self.handler_task = Some(handler_task);

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Launch(e.to_string()))?;
        self.browser = Some(browser);

        let user_agent = self.pick_user_agent(options);
        if let Some(ua) = &user_agent {
            page.set_user_agent(ua.as_str()).await.map_err(cdp_err)?;
        }

        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await
            .map_err(cdp_err)?;

        if !options.extra_headers.is_empty() {
            let headers = serde_json::to_value(&options.extra_headers).map_err(cdp_err)?;
            page.execute(SetExtraHttpHeadersParams::new(Headers::new(headers)))
                .await
                .map_err(cdp_err)?;
        }

        debug!(user_agent = ?user_agent, headless = options.headless, "browser_ready");
        self.page = Some(page);
        self.closed = false;
        Ok(())
    }

    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), EngineError> {
        self.elements.clear();
        let page = self.page()?;

        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(EngineError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(EngineError::Timeout(timeout)),
        }
    }

    async fn title(&mut self) -> Result<String, EngineError> {
        Ok(self
            .page()?
            .get_title()
            .await
            .map_err(cdp_err)?
            .unwrap_or_default())
    }

    async fn content(&mut self) -> Result<String, EngineError> {
        self.page()?.content().await.map_err(cdp_err)
    }

    async fn current_url(&mut self) -> Result<Option<String>, EngineError> {
        self.page()?.url().await.map_err(cdp_err)
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementHandle>, EngineError> {
        let found = self
            .page()?
            .find_elements(selector)
            .await
            .map_err(|e| EngineError::InvalidSelector(format!("{}: {}", selector, e)))?;
        Ok(found.into_iter().map(|el| self.register(el)).collect())
    }

    async fn find_within(
        &mut self,
        scope: ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>, EngineError> {
        let found = self
            .element(scope)?
            .find_elements(selector)
            .await
            .map_err(|e| EngineError::InvalidSelector(format!("{}: {}", selector, e)))?;
        Ok(found.into_iter().next().map(|el| self.register(el)))
    }

    async fn closest(
        &mut self,
        element: ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>, EngineError> {
        // Tag the ancestor in the DOM, then look it up through a regular query
        let marker = ANCHOR_SEQ.fetch_add(1, Ordering::Relaxed).to_string();
        let quoted = serde_json::to_string(selector).map_err(cdp_err)?;
        let function = format!(
            "function() {{ const p = this.parentElement; const a = p ? p.closest({}) : null; \
             if (a) {{ a.setAttribute('data-gpuscout-anchor', '{}'); }} return !!a; }}",
            quoted, marker
        );

        let result = self
            .element(element)?
            .call_js_fn(function, false)
            .await
            .map_err(|e| EngineError::Script(e.to_string()))?;
        let found = result
            .result
            .value
            .as_ref()
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !found {
            return Ok(None);
        }

        let anchors = self
            .page()?
            .find_elements(format!("[data-gpuscout-anchor='{}']", marker))
            .await
            .map_err(cdp_err)?;
        Ok(anchors.into_iter().next().map(|el| self.register(el)))
    }

    async fn text(&mut self, element: ElementHandle) -> Result<Option<String>, EngineError> {
        self.element(element)?.inner_text().await.map_err(cdp_err)
    }

    async fn attribute(
        &mut self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, EngineError> {
        self.element(element)?.attribute(name).await.map_err(cdp_err)
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<(), EngineError> {
        Self::poll_until(self.page()?.clone(), selector, timeout, |count| count > 0).await
    }

    async fn wait_for_detached(&mut self, selector: &str, timeout: Duration) -> Result<(), EngineError> {
        Self::poll_until(self.page()?.clone(), selector, timeout, |count| count == 0).await
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value, EngineError> {
        let result = self
            .page()?
            .evaluate(script)
            .await
            .map_err(|e| EngineError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn move_mouse(&mut self, x: f64, y: f64) -> Result<(), EngineError> {
        self.page()?
            .move_mouse(Point::new(x, y))
            .await
            .map(|_| ())
            .map_err(cdp_err)
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.elements.clear();
        self.page = None;

        let mut outcome = Ok(());
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser cleanly: {}", e);
                outcome = Err(cdp_err(e));
            }
            let _ = browser.wait().await;
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
        debug!("browser_closed");
        outcome
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}

/// 每次创建新的 Chromium 会话
pub struct ChromiumSessionFactory {
    settings: BrowserSettings,
}

impl ChromiumSessionFactory {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

impl SessionFactory for ChromiumSessionFactory {
    fn create(&self) -> Box<dyn BrowserSession> {
        Box::new(ChromiumSession::new(self.settings.clone()))
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}
