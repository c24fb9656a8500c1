// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::models::extraction::ExtractedRecord;
use crate::domain::models::product::Store;
use crate::domain::services::page_inspector::KeywordMatcher;
use crate::domain::services::price_parser::PriceParser;
use crate::engines::traits::{BrowserSession, ElementHandle};
use crate::scrapers::selectors::{FieldExtractor, StoreSelectors};
use crate::utils::humanize::Humanizer;
use crate::utils::url_utils::absolutize;

/// 从卡片中取到的价格
#[derive(Debug, Clone, PartialEq)]
pub struct PriceCandidate {
    /// 页面上的原始文本
    pub raw: String,
    /// 解析出的金额，无法解析时为 `None`
    pub value: Option<f64>,
    /// 命中的选择器
    pub selector: Option<String>,
}

/// 单个商店的抓取能力
///
/// 提供选择器、分页URL和商店特有的处理；抓取循环本身由编排器负责
#[async_trait]
pub trait StoreCrawler: Send + Sync {
    fn store(&self) -> Store;

    fn selectors(&self) -> &StoreSelectors;

    /// 第 `page` 页（从1开始）的列表URL
    fn page_url(&self, page: u32) -> String;

    /// 相对链接的基准地址
    fn base_url(&self) -> &'static str {
        self.store().base_url()
    }

    /// 每个请求附带的额外请求头
    fn extra_headers(&self) -> Vec<(&'static str, &'static str)> {
        Vec::new()
    }

    /// 维护页面标题中出现的短语
    fn maintenance_markers(&self) -> &'static [&'static str] {
        &[]
    }

    /// 导航完成后、检查页面之前的商店特有等待
    ///
    /// 失败只应记录日志
    async fn after_navigation(&self, _session: &mut dyn BrowserSession, _humanizer: &Humanizer) {}

    /// 提取价格
    ///
    /// 默认取价格选择器的第一个非空文本，并按分隔符位置推断格式
    async fn extract_price(
        &self,
        extractor: &mut FieldExtractor<'_>,
        card: ElementHandle,
    ) -> Option<PriceCandidate> {
        let hit = extractor.extract_text(card, &self.selectors().price).await?;
        Some(PriceCandidate {
            value: PriceParser::parse_amount(&hit.value).ok(),
            raw: hit.value,
            selector: Some(hit.selector),
        })
    }

    /// 从一个商品卡片提取原始记录
    async fn extract_record(
        &self,
        extractor: &mut FieldExtractor<'_>,
        card: ElementHandle,
        unavailable: &KeywordMatcher,
    ) -> ExtractedRecord {
        let selectors = self.selectors();
        let mut record = ExtractedRecord {
            available: true,
            ..ExtractedRecord::default()
        };

        if let Some(hit) = extractor.extract_text(card, &selectors.title).await {
            record.title = Some(hit.value);
            record.matched.title = Some(hit.selector);
        }

        if let Some(price) = self.extract_price(extractor, card).await {
            record.price_raw = Some(price.raw);
            record.price_value = price.value;
            record.matched.price = price.selector;
        }

        if let Some(hit) = extractor.extract_attribute(card, &selectors.link, "href").await {
            record.url = absolutize(self.base_url(), &hit.value);
            record.matched.link = Some(hit.selector);
        }

        let (available, indicator) = extractor
            .is_available(card, &selectors.availability, unavailable)
            .await;
        record.available = available;
        record.matched.availability = indicator;

        debug!(
            store = %self.store(),
            title = ?record.title,
            price = ?record.price_value,
            title_selector = ?record.matched.title,
            price_selector = ?record.matched.price,
            "record_extracted"
        );
        record
    }
}
