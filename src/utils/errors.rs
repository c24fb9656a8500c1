// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::domain::repositories::product_repository::RepositoryError;
use crate::engines::traits::EngineError;

/// 抓取流程错误类型
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// 浏览器会话初始化失败（致命）
    #[error("会话初始化失败: {0}")]
    SessionInit(#[source] EngineError),

    /// 页面加载失败（可恢复，计入错误数）
    #[error("页面加载失败 {url}: {reason}")]
    PageLoad { url: String, reason: String },

    /// 单个元素提取失败（跳过该元素）
    #[error("提取失败: {0}")]
    Extraction(String),

    /// 重试次数耗尽
    #[error("重试 {attempts} 次后仍然失败: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },

    #[error("未知商店: {0}")]
    UnknownStore(String),

    #[error("无效配置: {0}")]
    InvalidConfig(String),

    #[error("仓库错误: {0}")]
    Repository(#[from] RepositoryError),
}

impl ScrapeError {
    /// 是否属于页面加载类错误
    ///
    /// 维护页面和重试耗尽都按页面加载失败处理
    pub fn is_page_load(&self) -> bool {
        matches!(
            self,
            ScrapeError::PageLoad { .. } | ScrapeError::MaxRetriesExceeded { .. }
        )
    }

    pub fn page_load(url: impl Into<String>, reason: impl ToString) -> Self {
        ScrapeError::PageLoad {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
