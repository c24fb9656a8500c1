// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use gpuscout::engines::snapshot_session::SnapshotPage;
use gpuscout::scrapers::registry::ScraperRegistry;
use std::collections::HashMap;

/// Terabyte 风格的商品卡片
pub struct Card<'a> {
    pub title: &'a str,
    pub price: Option<&'a str>,
    pub href: &'a str,
    pub sold_out: bool,
}

impl<'a> Card<'a> {
    pub fn new(title: &'a str, price: &'a str, href: &'a str) -> Self {
        Self {
            title,
            price: Some(price),
            href,
            sold_out: false,
        }
    }

    pub fn without_price(title: &'a str, href: &'a str) -> Self {
        Self {
            title,
            price: None,
            href,
            sold_out: false,
        }
    }

    pub fn sold_out(mut self) -> Self {
        self.sold_out = true;
        self
    }

    fn render(&self) -> String {
        let price = self
            .price
            .map(|p| format!(r#"<div class="prod-new-price"><span>{}</span> à vista</div>"#, p))
            .unwrap_or_default();
        let sold_out = if self.sold_out {
            r#"<div class="tbt_esgotado">Esgotado</div>"#
        } else {
            ""
        };
        format!(
            r#"<div class="product-item"><a class="prod-name" href="{}">{}</a>{}{}</div>"#,
            self.href, self.title, price, sold_out
        )
    }
}

/// 一个 Terabyte 列表页
pub fn terabyte_page(cards: &[Card<'_>]) -> String {
    let body: String = cards.iter().map(Card::render).collect();
    format!(
        "<html><head><title>Placas de Vídeo | Terabyteshop</title></head><body><div class=\"grid\">{}</div></body></html>",
        body
    )
}

/// 三张不同的有效卡片
pub fn terabyte_listing(page: u32) -> String {
    let hrefs: Vec<String> = (0..3)
        .map(|i| format!("/produto/{}{}/placa-de-video", page, i))
        .collect();
    terabyte_page(&[
        Card::new("Placa de Vídeo Gigabyte GeForce RTX 4070 Super Windforce", "R$ 4.299,90", &hrefs[0]),
        Card::new("Placa de Vídeo Sapphire Pulse AMD Radeon RX 7800 XT", "R$ 3.499,00", &hrefs[1]),
        Card::new("Placa de Vídeo ASRock Intel Arc A770 Phantom Gaming", "R$ 2.199,99", &hrefs[2]),
    ])
}

/// Cloudflare 挑战页
pub fn challenge_page() -> String {
    "<html><head><title>Just a moment...</title></head><body><div id=\"challenge-platform\"></div></body></html>"
        .to_string()
}

/// 商店维护页
pub fn maintenance_page(title: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body><h1>Voltamos em breve</h1></body></html>",
        title
    )
}

/// 商店第 `page` 页的URL
pub fn page_url(store: &str, page: u32) -> String {
    ScraperRegistry::with_defaults()
        .create(store)
        .map(|crawler| crawler.page_url(page))
        .expect("known store")
}

/// 为 1..=`pages` 页生成有效列表
pub fn terabyte_site(pages: u32) -> HashMap<String, SnapshotPage> {
    (1..=pages)
        .map(|p| (page_url("terabyte", p), SnapshotPage::Html(terabyte_listing(p))))
        .collect()
}
