// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::models::product::Store;
use crate::scrapers::kabum::KabumCrawler;
use crate::scrapers::pichau::PichauCrawler;
use crate::scrapers::terabyte::TerabyteCrawler;
use crate::scrapers::traits::StoreCrawler;
use crate::utils::errors::ScrapeError;

/// 商店抓取器注册表
///
/// 按商店标识查找对应的 [`StoreCrawler`]
#[derive(Clone, Default)]
pub struct ScraperRegistry {
    crawlers: BTreeMap<Store, Arc<dyn StoreCrawler>>,
}

impl ScraperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册全部内置商店
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PichauCrawler::new()));
        registry.register(Arc::new(KabumCrawler::new()));
        registry.register(Arc::new(TerabyteCrawler::new()));
        registry
    }

    /// 注册抓取器，同一商店后注册的覆盖先注册的
    pub fn register(&mut self, crawler: Arc<dyn StoreCrawler>) {
        self.crawlers.insert(crawler.store(), crawler);
    }

    pub fn get(&self, store: Store) -> Option<Arc<dyn StoreCrawler>> {
        self.crawlers.get(&store).cloned()
    }

    /// 按商店标识（不区分大小写）创建抓取器
    ///
    /// # 返回值
    ///
    /// 标识无法识别或未注册时返回 [`ScrapeError::UnknownStore`]
    pub fn create(&self, store_id: &str) -> Result<Arc<dyn StoreCrawler>, ScrapeError> {
        store_id
            .parse::<Store>()
            .ok()
            .and_then(|store| self.get(store))
            .ok_or_else(|| ScrapeError::UnknownStore(store_id.to_string()))
    }

    /// 已注册的商店
    pub fn stores(&self) -> Vec<Store> {
        self.crawlers.keys().copied().collect()
    }
}
