// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::product::Store;
use crate::domain::models::scrape_run::{RunCounters, RunOutcome, ScrapeRun, StopReason};
use crate::domain::repositories::product_repository::RepositoryError;
use crate::domain::repositories::scrape_run_repository::{RunStats, ScrapeRunRepository};
use crate::infrastructure::database::entities::scrape_run;

/// 抓取运行仓库实现
#[derive(Clone)]
pub struct ScrapeRunRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl ScrapeRunRepoImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn to_column(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn from_column(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

#[async_trait]
impl ScrapeRunRepository for ScrapeRunRepoImpl {
    async fn save(&self, run: &ScrapeRun) -> Result<Uuid, RepositoryError> {
        let counters = run.counters();
        let model = scrape_run::ActiveModel {
            id: Set(run.id()),
            store: Set(run.store().id().to_string()),
            started_at: Set(run.started_at().into()),
            finished_at: Set(run.finished_at().map(Into::into)),
            execution_time_secs: Set(run.execution_time().map(|d| d.as_secs_f64())),
            pages_scraped: Set(to_column(counters.pages_scraped)),
            products_found: Set(to_column(counters.products_found)),
            products_saved: Set(to_column(counters.products_saved)),
            products_skipped: Set(to_column(counters.products_skipped)),
            unavailable_count: Set(to_column(counters.unavailable_count)),
            errors: Set(to_column(counters.errors)),
            captchas_detected: Set(to_column(counters.captchas_detected)),
            success: Set(run.is_success()),
            stop_reason: Set(run.stop_reason().map(|r| r.as_str().to_string())),
            error_message: Set(run.error_message().map(str::to_string)),
        };

        let saved = model.insert(self.db.as_ref()).await?;
        Ok(saved.id)
    }

    async fn recent(
        &self,
        limit: u64,
        store: Option<Store>,
    ) -> Result<Vec<ScrapeRun>, RepositoryError> {
        scrape_run::Entity::find()
            .apply_if(store, |query, store| {
                query.filter(scrape_run::Column::Store.eq(store.id()))
            })
            .order_by_desc(scrape_run::Column::StartedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(ScrapeRun::try_from)
            .collect()
    }

    async fn stats(&self, since: DateTime<Utc>) -> Result<RunStats, RepositoryError> {
        let runs = scrape_run::Entity::find()
            .filter(scrape_run::Column::StartedAt.gte(since))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(ScrapeRun::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RunStats::from_runs(&runs))
    }
}

impl TryFrom<scrape_run::Model> for ScrapeRun {
    type Error = RepositoryError;

    fn try_from(model: scrape_run::Model) -> Result<Self, Self::Error> {
        let store = model
            .store
            .parse::<Store>()
            .map_err(RepositoryError::InvalidData)?;
        let stop_reason = model
            .stop_reason
            .as_deref()
            .map(str::parse::<StopReason>)
            .transpose()
            .map_err(RepositoryError::InvalidData)?;

        let finished_at: Option<DateTime<Utc>> = model.finished_at.map(Into::into);
        let outcome = finished_at.map(|_| {
            if model.success {
                RunOutcome::Success
            } else {
                RunOutcome::Failure {
                    message: model.error_message.clone().unwrap_or_default(),
                }
            }
        });

        let counters = RunCounters {
            pages_scraped: from_column(model.pages_scraped),
            products_found: from_column(model.products_found),
            products_saved: from_column(model.products_saved),
            products_skipped: from_column(model.products_skipped),
            unavailable_count: from_column(model.unavailable_count),
            errors: from_column(model.errors),
            captchas_detected: from_column(model.captchas_detected),
        };

        Ok(ScrapeRun::restore(
            model.id,
            store,
            model.started_at.into(),
            finished_at,
            counters,
            outcome,
            stop_reason,
        ))
    }
}
