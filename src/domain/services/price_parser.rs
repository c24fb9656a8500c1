// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::domain::models::extraction::PriceBounds;

/// 分期价格过滤阈值：只保留大于最大值 20% 的候选价格
pub const INSTALLMENT_THRESHOLD_RATIO: f64 = 0.2;

static CURRENCY_AMOUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"R\$\s*([\d.,]+)").unwrap());

// Currency marker (R$, US$, €, BRL...) before or after the number
static CURRENCY_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*(?:[a-z]{0,3}\$|€|£|brl|usd|eur)?\s*(.*?)\s*(?:[a-z]{0,3}\$|€|£|brl|usd|eur)?\s*$")
        .unwrap()
});

/// 价格解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceParseError {
    #[error("Empty price string")]
    Empty,
    #[error("Invalid price format: {0}")]
    Invalid(String),
}

/// 本地化价格解析器
///
/// 页面不会告诉我们使用哪种数字格式，只能从分隔符的位置推断：
/// - 同时出现 `.` 和 `,` 时，靠右的是小数分隔符（`1.234,56` / `1,234.56`）
/// - 只出现 `,` 时视为小数分隔符
/// - 只出现 `.` 时视为小数分隔符
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceParser {
    bounds: PriceBounds,
}

impl PriceParser {
    pub fn new(bounds: PriceBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> PriceBounds {
        self.bounds
    }

    /// 按分隔符位置推断格式并解析金额
    pub fn parse_amount(raw: &str) -> Result<f64, PriceParseError> {
        let cleaned = clean(raw)?;
        let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
            (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
            (Some(_), Some(_)) => cleaned.replace(',', ""),
            (None, Some(_)) => cleaned.replace(',', "."),
            _ => cleaned,
        };
        to_number(&normalized, raw)
    }

    /// 严格的巴西格式：`.` 总是千位分隔符，`,` 总是小数分隔符
    pub fn parse_brazilian(raw: &str) -> Result<f64, PriceParseError> {
        let cleaned = clean(raw)?;
        to_number(&cleaned.replace('.', "").replace(',', "."), raw)
    }

    /// 金额是否落在合理区间
    pub fn is_plausible(&self, amount: f64) -> bool {
        self.bounds.contains(amount)
    }

    /// 文本中所有 `R$` 金额，无法解析的片段被忽略
    pub fn find_amounts(text: &str) -> Vec<f64> {
        CURRENCY_AMOUNT
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| Self::parse_amount(m.as_str()).ok())
            .collect()
    }

    /// 文本中第一个 `R$` 金额，按巴西格式解析
    ///
    /// 返回 `(原始片段, 金额)`
    pub fn first_brazilian_amount(text: &str) -> Option<(String, f64)> {
        let caps = CURRENCY_AMOUNT.captures(text)?;
        let number = caps.get(1)?.as_str();
        let amount = Self::parse_brazilian(number).ok()?;
        Some((format!("R$ {}", number), amount))
    }

    /// 在同一段文本中的多个金额里挑出真实售价
    ///
    /// 分期金额（如 12x R$ 529,41）明显小于真实价格；取大于
    /// 最大值 [`INSTALLMENT_THRESHOLD_RATIO`] 的最小值。过滤后为空时退回全体最小值。
    pub fn select_listed_price(values: &[f64]) -> Option<f64> {
        let max = values.iter().copied().reduce(f64::max)?;
        let threshold = max * INSTALLMENT_THRESHOLD_RATIO;

        values
            .iter()
            .copied()
            .filter(|v| *v > threshold)
            .reduce(f64::min)
            .or_else(|| values.iter().copied().reduce(f64::min))
    }

    /// 格式化为巴西写法，例如 `R$ 5.399,99`
    pub fn format_brl(amount: f64) -> String {
        let fixed = format!("{:.2}", amount.abs());
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        let sign = if amount < 0.0 { "-" } else { "" };
        format!("R$ {}{},{}", sign, grouped, frac_part)
    }
}

fn clean(raw: &str) -> Result<String, PriceParseError> {
    let core = CURRENCY_MARKERS
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map_or(raw, |m| m.as_str());
    let cleaned: String = core.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.is_empty() {
        return Err(PriceParseError::Empty);
    }
    if !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return Err(PriceParseError::Invalid(raw.to_string()));
    }
    Ok(cleaned)
}

fn to_number(normalized: &str, raw: &str) -> Result<f64, PriceParseError> {
    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PriceParseError::Invalid(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brazilian_format() {
        assert_eq!(PriceParser::parse_amount("R$ 2.500,99").unwrap(), 2500.99);
        assert_eq!(PriceParser::parse_amount("R$\u{a0}12.345,00").unwrap(), 12345.0);
    }

    #[test]
    fn test_us_format() {
        assert_eq!(PriceParser::parse_amount("R$ 1,234.56").unwrap(), 1234.56);
        assert_eq!(PriceParser::parse_amount("26,999.99").unwrap(), 26999.99);
    }

    #[test]
    fn test_single_separator_is_decimal() {
        assert_eq!(PriceParser::parse_amount("1234,56").unwrap(), 1234.56);
        assert_eq!(PriceParser::parse_amount("1234.56").unwrap(), 1234.56);
        assert_eq!(PriceParser::parse_amount("R$ 799").unwrap(), 799.0);
    }

    #[test]
    fn test_other_currency_symbols_are_stripped() {
        assert_eq!(PriceParser::parse_amount("US$ 1,234.56").unwrap(), 1234.56);
        assert_eq!(PriceParser::parse_amount("€ 1.234,56").unwrap(), 1234.56);
        assert_eq!(PriceParser::parse_amount("1.234,56 BRL").unwrap(), 1234.56);
        assert!(matches!(
            PriceParser::parse_amount("R$ 1.2x4,56"),
            Err(PriceParseError::Invalid(_))
        ));
    }

    #[test]
    fn test_invalid_strings() {
        assert_eq!(PriceParser::parse_amount("  R$ "), Err(PriceParseError::Empty));
        assert!(matches!(
            PriceParser::parse_amount("consulte"),
            Err(PriceParseError::Invalid(_))
        ));
        assert!(PriceParser::parse_amount("1.2.3,4,5").is_err());
    }

    #[test]
    fn test_brazilian_strict() {
        assert_eq!(PriceParser::parse_brazilian("R$ 5.399").unwrap(), 5399.0);
        assert_eq!(PriceParser::parse_brazilian("1.234,56").unwrap(), 1234.56);
    }

    #[test]
    fn test_plausibility_bounds() {
        let parser = PriceParser::default();
        assert!(!parser.is_plausible(PriceParser::parse_amount("R$ 50,00").unwrap()));
        assert!(!parser.is_plausible(PriceParser::parse_amount("R$ 100.000,00").unwrap()));
        assert!(parser.is_plausible(PriceParser::parse_amount("R$ 2.500,99").unwrap()));
    }

    #[test]
    fn test_installment_filter_prefers_listed_price() {
        let values = [529.41, 5399.99, 26999.00];
        assert_eq!(PriceParser::select_listed_price(&values), Some(5399.99));
        assert_eq!(PriceParser::select_listed_price(&[]), None);
        assert_eq!(PriceParser::select_listed_price(&[1999.9]), Some(1999.9));
    }

    #[test]
    fn test_find_amounts_in_card_text() {
        let text = "de R$ 6.499,99 por R$ 5.399,99 à vista ou 12x de R$ 529,41";
        assert_eq!(PriceParser::find_amounts(text), vec![6499.99, 5399.99, 529.41]);
        assert_eq!(
            PriceParser::first_brazilian_amount(text),
            Some(("R$ 6.499,99".to_string(), 6499.99))
        );
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(PriceParser::format_brl(5399.99), "R$ 5.399,99");
        assert_eq!(PriceParser::format_brl(26999.0), "R$ 26.999,00");
        assert_eq!(PriceParser::format_brl(799.5), "R$ 799,50");
        assert_eq!(PriceParser::format_brl(1234567.891), "R$ 1.234.567,89");
    }
}
