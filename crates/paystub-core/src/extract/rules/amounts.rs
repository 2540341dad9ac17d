//! Amount normalization and the default first-match resolution strategy.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::trace;

use super::catalog::{FieldKey, PatternCatalog};
use super::patterns::DOLLAR_AMOUNT;

/// Convert a raw amount token into a signed two-decimal value.
///
/// Handles thousands separators, dollar signs and the OCR rendering where the
/// decimal point is read as a space (`"5 931 62"`). A trailing group counts as
/// cents only when it has exactly two digits; otherwise the groups are one
/// integer. Tokens that still do not parse yield zero.
pub fn normalize_amount(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let cleaned: String = unsigned.chars().filter(|c| *c != ',' && *c != '$').collect();
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();

    let candidate = match tokens.as_slice() {
        [] => return Decimal::ZERO,
        [single] if single.contains('.') => single.to_string(),
        [single] => format!("{}.00", single),
        [head @ .., cents] if is_cents(cents) => format!("{}.{}", head.concat(), cents),
        _ => {
            let joined = tokens.concat();
            if joined.contains('.') {
                joined
            } else {
                format!("{}.00", joined)
            }
        }
    };

    match Decimal::from_str(&candidate) {
        Ok(value) => {
            let value = value.round_dp(2);
            if negative { -value } else { value }
        }
        Err(e) => {
            trace!("Unparseable amount token {:?}: {}", raw, e);
            Decimal::ZERO
        }
    }
}

fn is_cents(token: &str) -> bool {
    token.len() == 2 && token.bytes().all(|b| b.is_ascii_digit())
}

/// Resolve a money field with the first pattern, in catalog order, that
/// matches. Returns zero when nothing matches.
pub fn extract_amount(catalog: &PatternCatalog, key: FieldKey, lowered: &str) -> Decimal {
    catalog
        .find_first(key, lowered)
        .map(|m| normalize_amount(m.value))
        .unwrap_or(Decimal::ZERO)
}

/// A dollar-prefixed amount found anywhere in the text.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountCandidate {
    /// Normalized value.
    pub value: Decimal,
    /// Byte offset where the match (including `$`) starts.
    pub start: usize,
    /// Byte offset where the match ends.
    pub end: usize,
}

/// Collect every dollar-prefixed amount, in document order.
pub fn dollar_candidates(lowered: &str) -> Vec<AmountCandidate> {
    DOLLAR_AMOUNT
        .captures_iter(lowered)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(AmountCandidate {
                value: normalize_amount(&caps[1]),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_normalize_standard() {
        assert_eq!(normalize_amount("1,234.56"), dec("1234.56"));
        assert_eq!(normalize_amount("$5,971.61"), dec("5971.61"));
        assert_eq!(normalize_amount("  86.59 "), dec("86.59"));
    }

    #[test]
    fn test_normalize_ocr_spaces() {
        assert_eq!(normalize_amount("5 931 62"), dec("5931.62"));
        assert_eq!(normalize_amount("298 08"), dec("298.08"));
        assert_eq!(normalize_amount("1 234 56"), dec("1234.56"));
    }

    #[test]
    fn test_normalize_negative() {
        assert_eq!(normalize_amount("-330 25"), dec("-330.25"));
        assert_eq!(normalize_amount("-1,000.00"), dec("-1000.00"));
    }

    #[test]
    fn test_normalize_integer_gets_cents() {
        let value = normalize_amount("1234");
        assert_eq!(value, dec("1234.00"));
        assert_eq!(value.scale(), 2);
    }

    #[test]
    fn test_normalize_trailing_group_not_cents() {
        // Three digit tail is a thousands group, not cents.
        assert_eq!(normalize_amount("12 345"), dec("12345.00"));
        assert_eq!(normalize_amount("1 2 3"), dec("123.00"));
    }

    #[test]
    fn test_normalize_failure_is_zero() {
        assert_eq!(normalize_amount(""), Decimal::ZERO);
        assert_eq!(normalize_amount("n/a"), Decimal::ZERO);
        assert_eq!(normalize_amount("12.34.56"), Decimal::ZERO);
    }

    #[test]
    fn test_normalize_rounds_to_cents() {
        assert_eq!(normalize_amount("10.004"), dec("10.00"));
        assert_eq!(normalize_amount("10.126"), dec("10.13"));
    }

    #[test]
    fn test_extract_amount_first_match_wins() {
        let catalog = PatternCatalog::builtin().unwrap();
        let text = "gross pay $5,971.61\nearnings $200.00";

        assert_eq!(extract_amount(&catalog, FieldKey::GrossAmount, text), dec("5971.61"));
        assert_eq!(extract_amount(&catalog, FieldKey::Medicare, text), Decimal::ZERO);
    }

    #[test]
    fn test_dollar_candidates_positions() {
        let text = "gross $1,000.00 tax $85.10";
        let found = dollar_candidates(text);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].value, dec("1000.00"));
        assert_eq!(&text[found[1].start..found[1].end], "$85.10");
    }
}
