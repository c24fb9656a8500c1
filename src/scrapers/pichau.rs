// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use tracing::warn;

use crate::domain::models::product::Store;
use crate::domain::services::price_parser::PriceParser;
use crate::engines::traits::ElementHandle;
use crate::scrapers::selectors::{FieldExtractor, SelectorSet, StoreSelectors};
use crate::scrapers::traits::{PriceCandidate, StoreCrawler};

const LISTING_URL: &str = "https://www.pichau.com.br/hardware/placa-de-video";

/// 卡片文本中小于等于该值的金额不可能是显卡价格（运费、优惠券等）
const MIN_CARD_AMOUNT: f64 = 100.0;

const MAINTENANCE_MARKERS: &[&str] = &["Site em Manutenção", "Pru Pru"];

/// Pichau 抓取器
///
/// 卡片里同时出现原价、PIX价和分期价，需要用分期过滤规则挑出真实售价
pub struct PichauCrawler {
    selectors: StoreSelectors,
}

impl PichauCrawler {
    pub fn new() -> Self {
        Self {
            selectors: StoreSelectors {
                product_card: SelectorSet::new(
                    "product card",
                    &[
                        "div.MuiCard-root",
                        "article[data-cy*='product']",
                        "div[class*='ProductCard']",
                        "a[class*='product-card']",
                    ],
                ),
                title: SelectorSet::new(
                    "title",
                    &[
                        "h2",
                        "a[data-cy*='product-name']",
                        "div[class*='name']",
                        "h2[class*='MuiTypography']",
                    ],
                ),
                price: SelectorSet::new("price", &["div[class*='price']", "div[class*='Price']"]),
                link: SelectorSet::new(
                    "link",
                    &[
                        "a[data-cy*='product-link']",
                        "a[data-cy*='product-name']",
                        "a[href*='/hardware/']",
                        "a",
                        ":scope",
                        "closest(a)",
                    ],
                ),
                availability: SelectorSet::new("availability", &["button:disabled"]),
            },
        }
    }
}

impl Default for PichauCrawler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreCrawler for PichauCrawler {
    fn store(&self) -> Store {
        Store::Pichau
    }

    fn selectors(&self) -> &StoreSelectors {
        &self.selectors
    }

    fn page_url(&self, page: u32) -> String {
        if page <= 1 {
            LISTING_URL.to_string()
        } else {
            format!("{}?page={}", LISTING_URL, page)
        }
    }

    fn maintenance_markers(&self) -> &'static [&'static str] {
        MAINTENANCE_MARKERS
    }

    async fn extract_price(
        &self,
        extractor: &mut FieldExtractor<'_>,
        card: ElementHandle,
    ) -> Option<PriceCandidate> {
        // The price block only confirms the card has prices; amounts are read from the whole card
        let anchor = extractor.locate(card, &self.selectors.price).await?;
        let text = extractor.card_text(card).await?;

        let amounts: Vec<f64> = PriceParser::find_amounts(&text)
            .into_iter()
            .filter(|v| *v > MIN_CARD_AMOUNT)
            .collect();

        match PriceParser::select_listed_price(&amounts) {
            Some(best) => Some(PriceCandidate {
                raw: PriceParser::format_brl(best),
                value: Some(best),
                selector: Some(anchor.selector),
            }),
            None => {
                let snippet: String = text.chars().take(100).collect();
                warn!(store = "pichau", snippet = %snippet, "price_parse_failed");
                None
            }
        }
    }
}
