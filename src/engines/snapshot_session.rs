// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::engines::traits::{
    BrowserSession, ElementHandle, EngineError, SessionFactory, SessionOptions,
};
use crate::utils::url_utils::snapshot_key;

static ANY_ELEMENT: Lazy<Selector> = Lazy::new(|| Selector::parse("*").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

/// 回放用的页面
#[derive(Debug, Clone)]
pub enum SnapshotPage {
    /// 页面HTML
    Html(String),
    /// 导航到该URL会失败，附带失败原因
    Unreachable(String),
}

/// 基于 HTML 快照的离线会话
///
/// 不执行任何脚本；元素句柄是元素在文档中的先序位置。
/// `scraper::Html` 不能跨线程移动，所以每次查询都重新解析当前页面。
#[derive(Debug, Clone, Default)]
pub struct SnapshotSession {
    pages: Arc<HashMap<String, SnapshotPage>>,
    current: Option<(String, String)>,
    initialized: bool,
    closed: bool,
}

impl SnapshotSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pages(pages: Arc<HashMap<String, SnapshotPage>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    /// 注册一个可访问的页面
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.into(), SnapshotPage::Html(html.into()));
        self
    }

    /// 注册一个导航必然失败的页面
    pub fn with_unreachable(mut self, url: impl Into<String>, reason: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.into(), SnapshotPage::Unreachable(reason.into()));
        self
    }

    /// 读取目录（及其直接子目录）中的 `*.html` 快照
    ///
    /// 文件名（不含扩展名）作为键，与调试快照的命名规则一致
    pub async fn load_dir(dir: impl AsRef<Path>) -> std::io::Result<HashMap<String, SnapshotPage>> {
        let mut pages = HashMap::new();
        let mut pending = vec![(dir.as_ref().to_path_buf(), 0u8)];

        while let Some((current, depth)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&current).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    if depth == 0 {
                        pending.push((path, depth + 1));
                    }
                    continue;
                }
                if path.extension().and_then(|e| e.to_str()) != Some("html") {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    let html = tokio::fs::read_to_string(&path).await?;
                    pages.insert(stem.to_string(), SnapshotPage::Html(html));
                }
            }
        }

        debug!(count = pages.len(), "snapshots_loaded");
        Ok(pages)
    }

    fn ensure_open(&self) -> Result<(), EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        Ok(())
    }

    fn with_document<T, F>(&self, f: F) -> Result<T, EngineError>
    where
        F: for<'d> FnOnce(&'d Html, &[ElementRef<'d>]) -> Result<T, EngineError>,
    {
        self.ensure_open()?;
        let (_, html) = self.current.as_ref().ok_or(EngineError::NotInitialized)?;
        let document = Html::parse_document(html);
        let elements: Vec<ElementRef> = document.select(&ANY_ELEMENT).collect();
        f(&document, &elements)
    }

    fn with_element<T, F>(&self, handle: ElementHandle, f: F) -> Result<T, EngineError>
    where
        F: for<'d> FnOnce(ElementRef<'d>, &[ElementRef<'d>]) -> Result<T, EngineError>,
    {
        self.with_document(|_, elements| {
            let element = elements
                .get(handle.index())
                .copied()
                .ok_or(EngineError::StaleElement(handle.index()))?;
            f(element, elements)
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, EngineError> {
    Selector::parse(selector).map_err(|e| EngineError::InvalidSelector(format!("{}: {}", selector, e)))
}

fn position_of(elements: &[ElementRef<'_>], target: ElementRef<'_>) -> Option<ElementHandle> {
    elements
        .iter()
        .position(|e| e.id() == target.id())
        .map(ElementHandle::new)
}

fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl BrowserSession for SnapshotSession {
    async fn initialize(&mut self, _options: &SessionOptions) -> Result<(), EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        self.initialized = true;
        Ok(())
    }

    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), EngineError> {
        self.ensure_open()?;
        let page = self
            .pages
            .get(url)
            .or_else(|| self.pages.get(&snapshot_key(url)))
            .cloned();

        match page {
            Some(SnapshotPage::Html(html)) => {
                self.current = Some((url.to_string(), html));
                Ok(())
            }
            Some(SnapshotPage::Unreachable(reason)) => Err(EngineError::Navigation {
                url: url.to_string(),
                reason,
            }),
            None => Err(EngineError::Navigation {
                url: url.to_string(),
                reason: "no snapshot recorded for url".to_string(),
            }),
        }
    }

    async fn title(&mut self) -> Result<String, EngineError> {
        self.with_document(|document, _| {
            Ok(document
                .select(&TITLE)
                .next()
                .map(visible_text)
                .unwrap_or_default())
        })
    }

    async fn content(&mut self) -> Result<String, EngineError> {
        self.ensure_open()?;
        self.current
            .as_ref()
            .map(|(_, html)| html.clone())
            .ok_or(EngineError::NotInitialized)
    }

    async fn current_url(&mut self) -> Result<Option<String>, EngineError> {
        self.ensure_open()?;
        Ok(self.current.as_ref().map(|(url, _)| url.clone()))
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementHandle>, EngineError> {
        let selector = parse_selector(selector)?;
        self.with_document(|document, elements| {
            Ok(document
                .select(&selector)
                .filter_map(|m| position_of(elements, m))
                .collect())
        })
    }

    async fn find_within(
        &mut self,
        scope: ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>, EngineError> {
        let selector = parse_selector(selector)?;
        self.with_element(scope, |element, elements| {
            Ok(element
                .select(&selector)
                .next()
                .and_then(|m| position_of(elements, m)))
        })
    }

    async fn closest(
        &mut self,
        element: ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>, EngineError> {
        let selector = parse_selector(selector)?;
        self.with_element(element, |element, elements| {
            Ok(element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|a| selector.matches(a))
                .and_then(|a| position_of(elements, a)))
        })
    }

    async fn text(&mut self, element: ElementHandle) -> Result<Option<String>, EngineError> {
        self.with_element(element, |element, _| Ok(Some(visible_text(element))))
    }

    async fn attribute(
        &mut self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, EngineError> {
        self.with_element(element, |element, _| {
            Ok(element.value().attr(name).map(str::to_string))
        })
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<(), EngineError> {
        // A static document never changes, so absence is final
        if self.find_elements(selector).await?.is_empty() {
            return Err(EngineError::Timeout(timeout));
        }
        Ok(())
    }

    async fn wait_for_detached(&mut self, selector: &str, timeout: Duration) -> Result<(), EngineError> {
        if self.find_elements(selector).await?.is_empty() {
            return Ok(());
        }
        Err(EngineError::Timeout(timeout))
    }

    async fn evaluate(&mut self, _script: &str) -> Result<Value, EngineError> {
        self.ensure_open()?;
        Ok(Value::Null)
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        self.closed = true;
        self.current = None;
        Ok(())
    }
}

/// 共享同一组快照的会话工厂
pub struct SnapshotSessionFactory {
    pages: Arc<HashMap<String, SnapshotPage>>,
}

impl SnapshotSessionFactory {
    pub fn new(pages: HashMap<String, SnapshotPage>) -> Self {
        Self {
            pages: Arc::new(pages),
        }
    }
}

impl SessionFactory for SnapshotSessionFactory {
    fn create(&self) -> Box<dyn BrowserSession> {
        Box::new(SnapshotSession::from_pages(self.pages.clone()))
    }

    fn name(&self) -> &'static str {
        "snapshot"
    }
}
