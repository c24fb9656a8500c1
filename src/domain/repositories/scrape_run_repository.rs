// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::product_repository::RepositoryError;
use crate::domain::models::product::Store;
use crate::domain::models::scrape_run::ScrapeRun;

/// 运行统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_runs: u64,
    pub successful_runs: u64,
    /// 成功运行占比（百分比）
    pub success_rate: f64,
    /// 平均耗时（秒）
    pub average_execution_secs: Option<f64>,
}

impl RunStats {
    /// 根据一组已结束的运行计算统计
    pub fn from_runs<'a>(runs: impl IntoIterator<Item = &'a ScrapeRun>) -> Self {
        let mut stats = RunStats::default();
        let mut total_secs = 0.0;
        let mut timed = 0u64;

        for run in runs {
            stats.total_runs += 1;
            if run.is_success() {
                stats.successful_runs += 1;
            }
            if let Some(elapsed) = run.execution_time() {
                total_secs += elapsed.as_secs_f64();
                timed += 1;
            }
        }

        if stats.total_runs > 0 {
            stats.success_rate = stats.successful_runs as f64 / stats.total_runs as f64 * 100.0;
        }
        if timed > 0 {
            stats.average_execution_secs = Some(total_secs / timed as f64);
        }
        stats
    }
}

/// 抓取运行仓库特质
#[async_trait]
pub trait ScrapeRunRepository: Send + Sync {
    /// 保存一次已结束的运行
    ///
    /// # 返回值
    ///
    /// * `Ok(Uuid)` - 运行ID
    /// * `Err(RepositoryError)` - 保存失败
    async fn save(&self, run: &ScrapeRun) -> Result<Uuid, RepositoryError>;

    /// 最近的运行，按开始时间倒序
    async fn recent(
        &self,
        limit: u64,
        store: Option<Store>,
    ) -> Result<Vec<ScrapeRun>, RepositoryError>;

    /// 自 `since` 以来的运行统计
    async fn stats(&self, since: DateTime<Utc>) -> Result<RunStats, RepositoryError>;
}
