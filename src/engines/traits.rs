// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 浏览器启动或连接失败
    #[error("Browser launch failed: {0}")]
    Launch(String),
    /// 会话尚未初始化
    #[error("Session not initialized")]
    NotInitialized,
    /// 导航失败
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    /// 超时
    #[error("Timeout after {0:?}")]
    Timeout(Duration),
    /// 选择器无效
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
    /// 元素句柄已失效（页面已切换）
    #[error("Stale element handle: {0}")]
    StaleElement(usize),
    /// 脚本执行失败
    #[error("Script evaluation failed: {0}")]
    Script(String),
    /// 会话已关闭
    #[error("Session closed")]
    Closed,
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 如果错误是可重试的则返回true，否则返回false
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Navigation { .. } | EngineError::Timeout(_))
    }
}

/// 视口大小
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// 会话初始化参数
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub headless: bool,
    pub user_agent: Option<String>,
    pub viewport: Option<Viewport>,
    pub locale: Option<String>,
    /// 默认请求超时
    pub timeout: Duration,
    /// 每个请求附带的额外请求头
    pub extra_headers: HashMap<String, String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: None,
            viewport: Some(Viewport {
                width: 1920,
                height: 1080,
            }),
            locale: Some("pt-BR".to_string()),
            timeout: Duration::from_millis(30_000),
            extra_headers: HashMap::new(),
        }
    }
}

/// 当前页面上某个元素的不透明句柄
///
/// 只在获取它的页面上有效，导航后失效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(usize);

impl ElementHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// 浏览器会话
///
/// 编排器只通过这个契约使用浏览器：导航、查询元素、读取文本和属性、关闭。
/// 一个会话在任意时刻只属于一次运行。
#[async_trait]
pub trait BrowserSession: Send {
    /// 启动浏览器并应用反检测设置
    async fn initialize(&mut self, options: &SessionOptions) -> Result<(), EngineError>;

    /// 在超时时间内导航到URL
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), EngineError>;

    async fn title(&mut self) -> Result<String, EngineError>;

    /// 当前页面的完整HTML
    async fn content(&mut self) -> Result<String, EngineError>;

    async fn current_url(&mut self) -> Result<Option<String>, EngineError>;

    /// 在整个页面中查找元素
    async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementHandle>, EngineError>;

    /// 在 `scope` 内查找第一个匹配的后代元素
    async fn find_within(
        &mut self,
        scope: ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>, EngineError>;

    /// 查找 `element` 最近的匹配祖先（不含自身）
    async fn closest(
        &mut self,
        element: ElementHandle,
        selector: &str,
    ) -> Result<Option<ElementHandle>, EngineError>;

    /// 元素的可见文本
    async fn text(&mut self, element: ElementHandle) -> Result<Option<String>, EngineError>;

    async fn attribute(
        &mut self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, EngineError>;

    /// 等待选择器出现
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration)
        -> Result<(), EngineError>;

    /// 等待选择器从页面上消失
    async fn wait_for_detached(&mut self, selector: &str, timeout: Duration)
        -> Result<(), EngineError>;

    async fn evaluate(&mut self, script: &str) -> Result<Value, EngineError>;

    async fn move_mouse(&mut self, _x: f64, _y: f64) -> Result<(), EngineError> {
        Ok(())
    }

    async fn scroll_by(&mut self, delta_y: i64) -> Result<(), EngineError> {
        self.evaluate(&format!("window.scrollBy(0, {})", delta_y))
            .await
            .map(|_| ())
    }

    /// 释放浏览器资源
    async fn close(&mut self) -> Result<(), EngineError>;
}

/// 为每次运行创建独占的浏览器会话
pub trait SessionFactory: Send + Sync {
    fn create(&self) -> Box<dyn BrowserSession>;

    fn name(&self) -> &'static str;
}
