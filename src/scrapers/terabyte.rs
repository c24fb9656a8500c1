// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::domain::models::product::Store;
use crate::domain::services::price_parser::PriceParser;
use crate::engines::traits::{BrowserSession, ElementHandle, EngineError};
use crate::scrapers::selectors::{FieldExtractor, SelectorSet, StoreSelectors};
use crate::scrapers::traits::{PriceCandidate, StoreCrawler};
use crate::utils::humanize::Humanizer;

const LISTING_URL: &str = "https://www.terabyteshop.com.br/hardware/placas-de-video";

const PRODUCT_GRID_SELECTOR: &str = "div.product-item";
const PRODUCT_GRID_TIMEOUT: Duration = Duration::from_secs(10);

/// TerabyteShop 抓取器
///
/// 列表是懒加载的，提取前需要先滚动页面
pub struct TerabyteCrawler {
    selectors: StoreSelectors,
}

impl TerabyteCrawler {
    pub fn new() -> Self {
        Self {
            selectors: StoreSelectors {
                product_card: SelectorSet::new(
                    "product card",
                    &["div.product-item", "div[class*='product-item']", "div.pbox"],
                ),
                title: SelectorSet::new(
                    "title",
                    &[
                        "a.prod-name",
                        "a[class*='prod-name']",
                        "h2",
                        "div.product-item__name",
                    ],
                ),
                price: SelectorSet::new(
                    "price",
                    &[
                        "div.product-item__new-price",
                        "div.prod-new-price",
                        "span.prod-new-price",
                        "div[class*='new-price']",
                    ],
                ),
                link: SelectorSet::new(
                    "link",
                    &["a.prod-name", "a.product-item__name", "a[href*='produto']"],
                ),
                availability: SelectorSet::new(
                    "availability",
                    &["div.tbt_esgotado", "div.indisponivel", "div[class*='esgotado']"],
                ),
            },
        }
    }

    async fn load_lazy_grid(
        &self,
        session: &mut dyn BrowserSession,
        humanizer: &Humanizer,
    ) -> Result<(), EngineError> {
        session.evaluate("window.scrollBy(0, 300)").await?;
        humanizer
            .short_pause(Duration::from_millis(rand::random_range(500..=1000)))
            .await;
        session
            .wait_for_selector(PRODUCT_GRID_SELECTOR, PRODUCT_GRID_TIMEOUT)
            .await?;
        session
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await?;
        humanizer
            .short_pause(Duration::from_millis(rand::random_range(1000..=2000)))
            .await;
        Ok(())
    }
}

impl Default for TerabyteCrawler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreCrawler for TerabyteCrawler {
    fn store(&self) -> Store {
        Store::Terabyte
    }

    fn selectors(&self) -> &StoreSelectors {
        &self.selectors
    }

    fn page_url(&self, page: u32) -> String {
        if page <= 1 {
            LISTING_URL.to_string()
        } else {
            format!("{}?pagina={}", LISTING_URL, page)
        }
    }

    async fn after_navigation(&self, session: &mut dyn BrowserSession, humanizer: &Humanizer) {
        if let Err(e) = self.load_lazy_grid(session, humanizer).await {
            warn!(error = %e, "error_during_page_load_scroll");
        }
    }

    async fn extract_price(
        &self,
        extractor: &mut FieldExtractor<'_>,
        card: ElementHandle,
    ) -> Option<PriceCandidate> {
        let hit = extractor
            .extract_text_containing(card, &self.selectors.price, "R$")
            .await?;
        let value = PriceParser::first_brazilian_amount(&hit.value).map(|(_, v)| v);
        Some(PriceCandidate {
            raw: hit.value,
            value,
            selector: Some(hit.selector),
        })
    }
}
