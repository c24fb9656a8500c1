// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use gpuscout::domain::models::extraction::{ExtractedRecord, PriceBounds, ValidationFailure};
use gpuscout::domain::services::price_parser::PriceParser;

fn record(price: &str) -> ExtractedRecord {
    ExtractedRecord {
        title: Some("Placa de Vídeo RTX 4060".to_string()),
        price_raw: Some(price.to_string()),
        price_value: PriceParser::parse_amount(price).ok(),
        url: Some("https://www.kabum.com.br/produto/1".to_string()),
        available: true,
        ..ExtractedRecord::default()
    }
}

#[test]
fn test_brazilian_prices_parse_to_decimals() {
    let cases = [
        ("R$ 2.500,99", 2500.99),
        ("R$ 1.234,56", 1234.56),
        ("R$ 12.999,00", 12999.0),
        ("R$ 899,90", 899.9),
        ("R$\u{a0}3.199,00", 3199.0),
    ];
    for (raw, expected) in cases {
        assert_eq!(PriceParser::parse_amount(raw).unwrap(), expected, "{}", raw);
    }
}

#[test]
fn test_out_of_range_prices_fail_validation() {
    let parser = PriceParser::new(PriceBounds::default());

    assert!(matches!(
        record("R$ 50,00").validate(&parser),
        Err(ValidationFailure::PriceOutOfRange { .. })
    ));
    assert!(matches!(
        record("R$ 100.000,00").validate(&parser),
        Err(ValidationFailure::PriceOutOfRange { .. })
    ));
    assert!(record("R$ 2.500,99").validate(&parser).is_ok());
}

#[test]
fn test_installment_filter_picks_cash_price() {
    let chosen = PriceParser::select_listed_price(&[529.41, 5399.99, 26999.00]);
    assert_eq!(chosen, Some(5399.99));
}

#[test]
fn test_amounts_found_in_card_text() {
    let text = "à vista R$ 5.399,99 ou R$ 26.999,00 em até 12x de R$ 529,41";
    assert_eq!(
        PriceParser::find_amounts(text),
        vec![5399.99, 26999.0, 529.41]
    );
    assert_eq!(PriceParser::format_brl(5399.99), "R$ 5.399,99");
}
