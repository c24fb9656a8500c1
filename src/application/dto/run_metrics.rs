// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::scrape_run::{ScrapeRun, StopReason};

/// 一次抓取运行的结果数据传输对象
///
/// `execute` 总是返回它，即使运行完全失败
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// 运行ID，请求在开始前被拒绝时为空
    pub run_id: Option<Uuid>,
    pub store: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// 执行耗时（秒）
    pub execution_time_secs: f64,
    pub pages_scraped: u32,
    pub products_found: u32,
    pub products_saved: u32,
    pub products_skipped: u32,
    pub unavailable_count: u32,
    pub errors: u32,
    pub captchas_detected: u32,
    /// 保存数占发现数的百分比
    pub success_rate: f64,
    pub success: bool,
    pub stop_reason: Option<StopReason>,
    pub error_message: Option<String>,
}

impl RunMetrics {
    /// 在创建运行之前就被拒绝的请求（未知商店、配置无效）
    pub fn rejected(store: impl Into<String>, message: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: None,
            store: store.into(),
            started_at: now,
            finished_at: Some(now),
            execution_time_secs: 0.0,
            pages_scraped: 0,
            products_found: 0,
            products_saved: 0,
            products_skipped: 0,
            unavailable_count: 0,
            errors: 0,
            captchas_detected: 0,
            success_rate: 0.0,
            success: false,
            stop_reason: None,
            error_message: Some(message.into()),
        }
    }
}

impl From<&ScrapeRun> for RunMetrics {
    fn from(run: &ScrapeRun) -> Self {
        let counters = run.counters();
        Self {
            run_id: Some(run.id()),
            store: run.store().id().to_string(),
            started_at: run.started_at(),
            finished_at: run.finished_at(),
            execution_time_secs: run
                .execution_time()
                .map(|d| d.as_secs_f64())
                .unwrap_or_default(),
            pages_scraped: counters.pages_scraped,
            products_found: counters.products_found,
            products_saved: counters.products_saved,
            products_skipped: counters.products_skipped,
            unavailable_count: counters.unavailable_count,
            errors: counters.errors,
            captchas_detected: counters.captchas_detected,
            success_rate: run.success_rate(),
            success: run.is_success(),
            stop_reason: run.stop_reason(),
            error_message: run.error_message().map(str::to_string),
        }
    }
}
