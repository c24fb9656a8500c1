// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::models::product::Store;
use crate::domain::services::price_parser::PriceParser;
use crate::engines::traits::{BrowserSession, ElementHandle};
use crate::scrapers::selectors::{FieldExtractor, SelectorSet, StoreSelectors};
use crate::scrapers::traits::{PriceCandidate, StoreCrawler};
use crate::utils::humanize::Humanizer;

const LISTING_URL: &str = "https://www.kabum.com.br/hardware/placa-de-video-vga";

/// 列表加载完成前显示的骨架屏
const SKELETON_SELECTOR: &str = "div.animate-pulse";
const SKELETON_TIMEOUT: Duration = Duration::from_secs(15);

/// Kabum 抓取器
pub struct KabumCrawler {
    selectors: StoreSelectors,
}

impl KabumCrawler {
    pub fn new() -> Self {
        Self {
            selectors: StoreSelectors {
                product_card: SelectorSet::new(
                    "product card",
                    &[
                        "article",
                        "div.productCard",
                        "div[class*='productCard']",
                        "div[class*='product']",
                    ],
                ),
                title: SelectorSet::new("title", &["span.nameCard", "h2", "span[class*='name']"]),
                price: SelectorSet::new(
                    "price",
                    &[
                        "span.priceCard",
                        "div[class*='price']",
                        "span[class*='finalPrice']",
                    ],
                ),
                link: SelectorSet::new("link", &["a"]),
                availability: SelectorSet::new(
                    "availability",
                    &["div.unavailable", "div[class*='unavailable']"],
                ),
            },
        }
    }
}

impl Default for KabumCrawler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreCrawler for KabumCrawler {
    fn store(&self) -> Store {
        Store::Kabum
    }

    fn selectors(&self) -> &StoreSelectors {
        &self.selectors
    }

    fn page_url(&self, page: u32) -> String {
        if page <= 1 {
            LISTING_URL.to_string()
        } else {
            format!(
                "{}?page_number={}&page_size=20&sort=most_searched",
                LISTING_URL, page
            )
        }
    }

    fn extra_headers(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("Accept-Language", "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7"),
            ("Referer", "https://www.google.com/"),
        ]
    }

    async fn after_navigation(&self, session: &mut dyn BrowserSession, _humanizer: &Humanizer) {
        debug!("waiting_for_skeletons_to_detach");
        match session.wait_for_detached(SKELETON_SELECTOR, SKELETON_TIMEOUT).await {
            Ok(()) => info!("skeletons_detached"),
            Err(e) => warn!(error = %e, "timeout_waiting_for_skeletons"),
        }
    }

    async fn extract_price(
        &self,
        extractor: &mut FieldExtractor<'_>,
        card: ElementHandle,
    ) -> Option<PriceCandidate> {
        if let Some(hit) = extractor
            .extract_text_containing(card, &self.selectors.price, "R$")
            .await
        {
            if let Ok(value) = PriceParser::parse_brazilian(&hit.value) {
                return Some(PriceCandidate {
                    raw: hit.value,
                    value: Some(value),
                    selector: Some(hit.selector),
                });
            }
            debug!(raw = %hit.value, "kabum_price_selector_unparsable");
        }

        let text = extractor.card_text(card).await?;
        let (raw, value) = PriceParser::first_brazilian_amount(&text)?;
        Some(PriceCandidate {
            raw,
            value: Some(value),
            selector: None,
        })
    }
}
