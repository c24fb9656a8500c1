// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use super::product::Store;

/// 抓取循环停止的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// 达到配置的最大页数
    MaxPagesReached,
    /// 累计错误达到阈值
    ErrorThreshold,
    /// 连续页面加载失败
    ConsecutiveLoadFailures,
    /// 遇到验证码拦截
    CaptchaDetected,
    /// 未分类的异常
    UnexpectedError,
    /// 外部取消
    Cancelled,
    /// 浏览器会话初始化失败
    SessionInitFailed,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::MaxPagesReached => "max_pages_reached",
            StopReason::ErrorThreshold => "error_threshold",
            StopReason::ConsecutiveLoadFailures => "consecutive_load_failures",
            StopReason::CaptchaDetected => "captcha_detected",
            StopReason::UnexpectedError => "unexpected_error",
            StopReason::Cancelled => "cancelled",
            StopReason::SessionInitFailed => "session_init_failed",
        }
    }

    /// 提前终止类的原因：循环没有自然走完，但已保存的数据仍然有效
    pub fn is_early_stop(&self) -> bool {
        matches!(
            self,
            StopReason::ErrorThreshold
                | StopReason::ConsecutiveLoadFailures
                | StopReason::CaptchaDetected
        )
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StopReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max_pages_reached" => Ok(StopReason::MaxPagesReached),
            "error_threshold" => Ok(StopReason::ErrorThreshold),
            "consecutive_load_failures" => Ok(StopReason::ConsecutiveLoadFailures),
            "captcha_detected" => Ok(StopReason::CaptchaDetected),
            "unexpected_error" => Ok(StopReason::UnexpectedError),
            "cancelled" => Ok(StopReason::Cancelled),
            "session_init_failed" => Ok(StopReason::SessionInitFailed),
            _ => Err(format!("Invalid stop reason: {}", s)),
        }
    }
}

/// 一次运行的计数器
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub pages_scraped: u32,
    pub products_found: u32,
    pub products_saved: u32,
    pub products_skipped: u32,
    pub unavailable_count: u32,
    pub errors: u32,
    pub captchas_detected: u32,
}

/// 运行结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    Failure { message: String },
}

/// 单次店铺抓取的聚合根
///
/// 创建即开始；抓取期间只由编排器修改；在收尾阶段恰好结束一次，
/// 之后交给运行仓库保存，不再变化。
///
/// 不变量：
/// - `products_saved <= products_found`
/// - `finished_at` 有值时结果已确定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeRun {
    id: Uuid,
    store: Store,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    counters: RunCounters,
    outcome: Option<RunOutcome>,
    stop_reason: Option<StopReason>,
}

impl ScrapeRun {
    /// 创建并立即开始一次运行
    pub fn start(store: Store) -> Self {
        Self {
            id: Uuid::new_v4(),
            store,
            started_at: Utc::now(),
            finished_at: None,
            counters: RunCounters::default(),
            outcome: None,
            stop_reason: None,
        }
    }

    /// 从持久化数据恢复
    pub fn restore(
        id: Uuid,
        store: Store,
        started_at: DateTime<Utc>,
        finished_at: Option<DateTime<Utc>>,
        counters: RunCounters,
        outcome: Option<RunOutcome>,
        stop_reason: Option<StopReason>,
    ) -> Self {
        Self {
            id,
            store,
            started_at,
            finished_at,
            counters,
            outcome,
            stop_reason,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn store(&self) -> Store {
        self.store
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Some(RunOutcome::Success))
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Some(RunOutcome::Failure { message }) => Some(message),
            _ => None,
        }
    }

    pub fn record_page(&mut self) {
        self.counters.pages_scraped += 1;
    }

    /// 记录本页发现的候选商品数
    pub fn record_products_found(&mut self, count: u32) {
        self.counters.products_found += count;
    }

    /// 记录一个已保存的商品
    ///
    /// 已保存数不能超过已发现数，违反时忽略并返回 `false`
    pub fn record_saved(&mut self) -> bool {
        if self.counters.products_saved >= self.counters.products_found {
            return false;
        }
        self.counters.products_saved += 1;
        true
    }

    pub fn record_skipped(&mut self) {
        self.counters.products_skipped += 1;
    }

    pub fn record_unavailable(&mut self) {
        self.counters.unavailable_count += 1;
    }

    pub fn record_error(&mut self) {
        self.counters.errors += 1;
    }

    pub fn record_captcha(&mut self) {
        self.counters.captchas_detected += 1;
    }

    /// 以成功结束运行，只有第一次调用生效
    pub fn finish_successfully(&mut self, reason: StopReason) -> bool {
        self.finish(RunOutcome::Success, reason)
    }

    /// 以失败结束运行，只有第一次调用生效
    pub fn finish_with_error(&mut self, reason: StopReason, message: impl Into<String>) -> bool {
        self.finish(
            RunOutcome::Failure {
                message: message.into(),
            },
            reason,
        )
    }

    fn finish(&mut self, outcome: RunOutcome, reason: StopReason) -> bool {
        if self.is_finished() {
            return false;
        }
        // Clock skew must never produce a negative duration
        self.finished_at = Some(Utc::now().max(self.started_at));
        self.outcome = Some(outcome);
        self.stop_reason = Some(reason);
        true
    }

    /// 运行耗时，未结束时为 `None`
    pub fn execution_time(&self) -> Option<Duration> {
        self.finished_at
            .map(|end| (end - self.started_at).to_std().unwrap_or_default())
    }

    /// 保存成功率（百分比），未发现任何商品时为 0
    pub fn success_rate(&self) -> f64 {
        if self.counters.products_found == 0 {
            return 0.0;
        }
        self.counters.products_saved as f64 / self.counters.products_found as f64 * 100.0
    }
}
