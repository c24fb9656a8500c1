// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use gpuscout::engines::snapshot_session::{SnapshotPage, SnapshotSession};
use gpuscout::engines::traits::{
    BrowserSession, ElementHandle, EngineError, SessionFactory, SessionOptions,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 注入到会话中的故障
#[derive(Debug, Clone)]
pub enum Fault {
    /// 初始化失败
    InitFailure,
    /// 导航到该URL时 panic
    PanicOn(String),
    /// 导航成功，但读取该页标题失败
    TitleErrorOn(String),
    /// 导航到该URL时挂起，直到被取消
    HangOn(String),
}

/// 所有由工厂创建的会话共享的观测数据
#[derive(Debug, Clone, Default)]
pub struct SessionProbe {
    created: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    visited: Arc<Mutex<Vec<String>>>,
}

impl SessionProbe {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().clone()
    }
}

/// 包装快照会话，记录调用并按需注入故障
pub struct RecordingSession {
    inner: SnapshotSession,
    probe: SessionProbe,
    fault: Option<Fault>,
    current: Option<String>,
}

#[async_trait]
impl BrowserSession for RecordingSession {
    async fn initialize(&mut self, options: &SessionOptions) -> Result<(), EngineError> {
        if matches!(self.fault, Some(Fault::InitFailure)) {
            return Err(EngineError::Launch("chrome not found".to_string()));
        }
        self.inner.initialize(options).await
    }

    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), EngineError> {
        self.probe.visited.lock().push(url.to_string());
        match &self.fault {
            Some(Fault::PanicOn(target)) if target == url => panic!("renderer crashed on {}", url),
            Some(Fault::HangOn(target)) if target == url => {
                std::future::pending::<()>().await;
            }
            _ => {}
        }
        self.current = Some(url.to_string());
        self.inner.navigate(url, timeout).await
    }

    async fn title(&mut self) -> Result<String, EngineError> {
        if let (Some(Fault::TitleErrorOn(target)), Some(current)) = (&self.fault, &self.current) {
            if target == current {
                return Err(EngineError::Script("execution context destroyed".to_string()));
            }
        }
        self.inner.title().await
    }

    async fn content(&mut self) -> Result<String, EngineError> {
        self.inner.content().await
    }

    async fn current_url(&mut self) -> Result<Option<String>, EngineError> {
        self.inner.current_url().await
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementHandle>, EngineError> {
        self.inner.find_elements(selector).await
    }

    async fn find_within(
        &mut self,
        scope: ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>, EngineError> {
        self.inner.find_within(scope, selector).await
    }

    async fn closest(
        &mut self,
        element: ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>, EngineError> {
        self.inner.closest(element, selector).await
    }

    async fn text(&mut self, element: ElementHandle) -> Result<Option<String>, EngineError> {
        self.inner.text(element).await
    }

    async fn attribute(
        &mut self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, EngineError> {
        self.inner.attribute(element, name).await
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<(), EngineError> {
        self.inner.wait_for_selector(selector, timeout).await
    }

    async fn wait_for_detached(&mut self, selector: &str, timeout: Duration) -> Result<(), EngineError> {
        self.inner.wait_for_detached(selector, timeout).await
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value, EngineError> {
        self.inner.evaluate(script).await
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        self.probe.closed.fetch_add(1, Ordering::SeqCst);
        self.inner.close().await
    }
}

/// 创建 [`RecordingSession`] 的工厂
pub struct RecordingFactory {
    pages: Arc<HashMap<String, SnapshotPage>>,
    probe: SessionProbe,
    fault: Option<Fault>,
}

impl RecordingFactory {
    pub fn new(pages: HashMap<String, SnapshotPage>, probe: SessionProbe, fault: Option<Fault>) -> Self {
        Self {
            pages: Arc::new(pages),
            probe,
            fault,
        }
    }
}

impl SessionFactory for RecordingFactory {
    fn create(&self) -> Box<dyn BrowserSession> {
        self.probe.created.fetch_add(1, Ordering::SeqCst);
        Box::new(RecordingSession {
            inner: SnapshotSession::from_pages(self.pages.clone()),
            probe: self.probe.clone(),
            fault: self.fault.clone(),
            current: None,
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
