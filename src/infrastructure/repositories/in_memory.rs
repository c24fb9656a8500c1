// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::models::product::{ChipBrand, EnrichedProduct, Store, StoredProduct};
use crate::domain::models::scrape_run::ScrapeRun;
use crate::domain::repositories::product_repository::{
    ProductRepository, ProductStats, RepositoryError,
};
use crate::domain::repositories::scrape_run_repository::{RunStats, ScrapeRunRepository};

/// 内存商品仓库，用于测试和试运行
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, StoredProduct>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.products.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.read().is_empty()
    }

    /// 所有商品的快照
    pub fn all(&self) -> Vec<StoredProduct> {
        self.products.read().values().cloned().collect()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn upsert(&self, product: &EnrichedProduct) -> Result<Uuid, RepositoryError> {
        let now = Utc::now();
        let mut products = self.products.write();
        let entry = products
            .entry(product.url.clone())
            .and_modify(|stored| {
                stored.product = product.clone();
                stored.updated_at = now;
            })
            .or_insert_with(|| StoredProduct {
                id: Uuid::new_v4(),
                product: product.clone(),
                created_at: now,
                updated_at: now,
            });
        Ok(entry.id)
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<StoredProduct>, RepositoryError> {
        Ok(self.products.read().get(url).cloned())
    }

    async fn best_deals(
        &self,
        limit: u64,
        chip_brand: Option<ChipBrand>,
    ) -> Result<Vec<StoredProduct>, RepositoryError> {
        let mut deals: Vec<StoredProduct> = self
            .products
            .read()
            .values()
            .filter(|p| p.product.available)
            .filter(|p| chip_brand.is_none_or(|b| p.product.chip_brand == b))
            .cloned()
            .collect();
        deals.sort_by(|a, b| a.product.price.amount.total_cmp(&b.product.price.amount));
        deals.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(deals)
    }

    async fn stats(&self) -> Result<ProductStats, RepositoryError> {
        let products = self.products.read();
        let mut stats = ProductStats::default();
        let mut sum = 0.0;

        for stored in products.values() {
            let p = &stored.product;
            let price = p.price.amount;
            stats.total += 1;
            if p.available {
                stats.available += 1;
            }
            *stats.by_store.entry(p.store.id().to_string()).or_default() += 1;
            *stats
                .by_chip_brand
                .entry(p.chip_brand.as_str().to_string())
                .or_default() += 1;
            sum += price;
            stats.min_price = Some(stats.min_price.map_or(price, |m: f64| m.min(price)));
            stats.max_price = Some(stats.max_price.map_or(price, |m: f64| m.max(price)));
        }
        if stats.total > 0 {
            stats.average_price = Some(sum / stats.total as f64);
        }
        Ok(stats)
    }

    async fn delete_older_than(&self, days: i64) -> Result<u64, RepositoryError> {
        let cutoff = Utc::now() - Duration::days(days);
        let mut products = self.products.write();
        let before = products.len();
        products.retain(|_, p| p.updated_at >= cutoff);
        Ok((before - products.len()) as u64)
    }
}

/// 内存运行仓库
#[derive(Default)]
pub struct InMemoryScrapeRunRepository {
    runs: RwLock<Vec<ScrapeRun>>,
}

impl InMemoryScrapeRunRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按保存顺序返回全部运行
    pub fn all(&self) -> Vec<ScrapeRun> {
        self.runs.read().clone()
    }
}

#[async_trait]
impl ScrapeRunRepository for InMemoryScrapeRunRepository {
    async fn save(&self, run: &ScrapeRun) -> Result<Uuid, RepositoryError> {
        self.runs.write().push(run.clone());
        Ok(run.id())
    }

    async fn recent(
        &self,
        limit: u64,
        store: Option<Store>,
    ) -> Result<Vec<ScrapeRun>, RepositoryError> {
        let mut runs: Vec<ScrapeRun> = self
            .runs
            .read()
            .iter()
            .filter(|r| store.is_none_or(|s| r.store() == s))
            .cloned()
            .collect();
        runs.sort_by_key(|r| std::cmp::Reverse(r.started_at()));
        runs.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(runs)
    }

    async fn stats(&self, since: DateTime<Utc>) -> Result<RunStats, RepositoryError> {
        let runs = self.runs.read();
        Ok(RunStats::from_runs(
            runs.iter().filter(|r| r.started_at() >= since),
        ))
    }
}
