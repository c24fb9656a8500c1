// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use gpuscout::domain::models::product::ChipBrand;
use gpuscout::domain::services::product_enricher::{ProductEnricher, GENERIC_MANUFACTURER};

#[test]
fn test_nvidia_wins_when_title_mentions_both_brands() {
    let enrichment = ProductEnricher::new().enrich("Placa RTX RX 4070 adaptador", "");
    assert_eq!(enrichment.chip_brand, ChipBrand::Nvidia);
    // the AMD pattern would read "RX 4070"; only the NVIDIA rule applies
    assert_eq!(enrichment.model, "Unknown");
}

#[test]
fn test_longest_suffix_is_extracted() {
    let enrichment =
        ProductEnricher::new().enrich("Placa de Vídeo Sapphire Nitro+ AMD Radeon RX 7900 XTX", "");
    assert_eq!(enrichment.model, "RX 7900 XTX");
    assert_eq!(enrichment.manufacturer, "SAPPHIRE");
}

#[test]
fn test_manufacturer_falls_back_to_url() {
    let enrichment = ProductEnricher::new().enrich(
        "Placa de Vídeo GeForce RTX 4060 Ti 8GB",
        "https://www.kabum.com.br/produto/123/placa-de-video-zotac-gaming-rtx-4060-ti",
    );
    assert_eq!(enrichment.manufacturer, "ZOTAC");
    assert_eq!(enrichment.model, "RTX 4060 TI");
}

#[test]
fn test_unrecognised_title_uses_sentinels() {
    let enrichment = ProductEnricher::new().enrich("Suporte para placa de vídeo", "");
    assert_eq!(enrichment.chip_brand, ChipBrand::Other);
    assert_eq!(enrichment.manufacturer, GENERIC_MANUFACTURER);
    assert_eq!(enrichment.model, "Unknown");
}
