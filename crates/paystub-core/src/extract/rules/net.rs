//! Net pay disambiguation.
//!
//! A statement prints many dollar figures and the "net pay" label is often
//! missing or far from the real value, so net pay goes through a fixed chain
//! of tiers. The first tier that yields a value wins; the order matters and
//! must not change.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::amounts::{dollar_candidates, extract_amount, normalize_amount, AmountCandidate};
use super::catalog::{FieldKey, PatternCatalog};
use crate::models::config::ExtractionConfig;

/// Which tier of the chain produced the net amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetSource {
    /// Dollar amount right after a payee marker.
    PayeeContext,
    /// Structural pattern anchored to a statement section.
    PriorityContext,
    /// Largest amount below gross with no tax words nearby.
    LargestCandidate,
    /// Largest value among the generic net pay labels.
    GenericPattern,
    /// Nothing matched.
    NotFound,
}

/// Resolved net amount and where it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetResolution {
    pub value: Decimal,
    pub source: NetSource,
}

impl NetResolution {
    fn new(value: Decimal, source: NetSource) -> Self {
        Self { value, source }
    }
}

/// Runs the net pay chain against lower-cased text.
pub struct NetResolver<'a> {
    catalog: &'a PatternCatalog,
    config: &'a ExtractionConfig,
    denylist: Vec<String>,
}

impl<'a> NetResolver<'a> {
    pub fn new(catalog: &'a PatternCatalog, config: &'a ExtractionConfig) -> Self {
        let denylist = config
            .context_denylist
            .iter()
            .map(|w| w.to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        Self {
            catalog,
            config,
            denylist,
        }
    }

    /// Resolve net pay. Returns zero with [`NetSource::NotFound`] when every
    /// tier comes up empty.
    pub fn resolve(&self, lowered: &str) -> NetResolution {
        let resolution = self
            .from_payee_context(lowered)
            .map(|v| NetResolution::new(v, NetSource::PayeeContext))
            .or_else(|| {
                self.from_priority_context(lowered)
                    .map(|v| NetResolution::new(v, NetSource::PriorityContext))
            })
            .or_else(|| {
                self.largest_candidate(lowered)
                    .map(|v| NetResolution::new(v, NetSource::LargestCandidate))
            })
            .or_else(|| {
                self.largest_generic(lowered)
                    .map(|v| NetResolution::new(v, NetSource::GenericPattern))
            })
            .unwrap_or(NetResolution::new(Decimal::ZERO, NetSource::NotFound));

        debug!(
            "Net amount {} resolved by {:?}",
            resolution.value, resolution.source
        );
        resolution
    }

    fn is_plausible(&self, value: Decimal) -> bool {
        value > Decimal::ZERO && value < self.config.plausible_max
    }

    /// Tier 1: amount following a payee marker.
    fn from_payee_context(&self, lowered: &str) -> Option<Decimal> {
        let caps = self.catalog.payee_context()?.captures(lowered)?;
        let value = normalize_amount(caps.get(1)?.as_str());

        if self.is_plausible(value) {
            Some(value)
        } else {
            self.reject("payee context", value, "outside plausible range");
            None
        }
    }

    /// Tier 2: section-anchored patterns, in order.
    fn from_priority_context(&self, lowered: &str) -> Option<Decimal> {
        self.catalog
            .net_priority()
            .iter()
            .filter_map(|pattern| pattern.captures(lowered))
            .filter_map(|caps| caps.get(1).map(|m| normalize_amount(m.as_str())))
            .find(|value| {
                let plausible = self.is_plausible(*value);
                if !plausible {
                    self.reject("priority context", *value, "outside plausible range");
                }
                plausible
            })
    }

    /// Tier 3: the largest dollar amount below gross that is not near any
    /// tax wording.
    fn largest_candidate(&self, lowered: &str) -> Option<Decimal> {
        let gross = extract_amount(self.catalog, FieldKey::GrossAmount, lowered);
        if gross.is_zero() {
            trace!("No gross amount, skipping candidate search");
            return None;
        }

        dollar_candidates(lowered)
            .into_iter()
            .filter(|c| self.is_candidate(lowered, c, gross))
            .map(|c| c.value)
            .max()
    }

    fn is_candidate(&self, lowered: &str, candidate: &AmountCandidate, gross: Decimal) -> bool {
        if candidate.value >= gross {
            self.reject("candidate", candidate.value, "not below gross");
            return false;
        }
        if candidate.value <= self.config.noise_floor {
            self.reject("candidate", candidate.value, "below noise floor");
            return false;
        }

        let window = surrounding(
            lowered,
            candidate.start,
            candidate.end,
            self.config.context_window,
        );
        if let Some(word) = self.denylist.iter().find(|w| window.contains(w.as_str())) {
            self.reject("candidate", candidate.value, &format!("near '{}'", word));
            return false;
        }

        true
    }

    /// Tier 4: every generic net label, keeping the largest value.
    fn largest_generic(&self, lowered: &str) -> Option<Decimal> {
        self.catalog
            .patterns(FieldKey::NetAmount)?
            .find_each_match(lowered)
            .into_iter()
            .map(|m| normalize_amount(m.value))
            .max()
    }

    fn reject(&self, tier: &str, value: Decimal, reason: &str) {
        if self.config.trace_candidates {
            trace!(tier, %value, reason, "Rejected net amount candidate");
        }
    }
}

/// Slice of `text` spanning `width` characters on each side of `start..end`.
fn surrounding(text: &str, start: usize, end: usize, width: usize) -> &str {
    let lo = text[..start]
        .char_indices()
        .rev()
        .take(width)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let hi = text[end..]
        .char_indices()
        .nth(width)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    &text[lo..hi]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    /// Join lines with filler wide enough to keep each line out of the
    /// others' context window.
    fn spaced(lines: &[&str]) -> String {
        let filler = format!("\n{}\n", "~".repeat(120));
        lines.join(&filler)
    }

    fn resolve(text: &str) -> NetResolution {
        resolve_with(text, &ExtractionConfig::default())
    }

    fn resolve_with(text: &str, config: &ExtractionConfig) -> NetResolution {
        let catalog = PatternCatalog::from_config(config).unwrap();
        NetResolver::new(&catalog, config).resolve(&text.to_lowercase())
    }

    #[test]
    fn test_payee_context_wins() {
        let text = spaced(&[
            "pay to the order of jane doe $2,104.88",
            "gross pay $3,000.00",
            "net pay $9.99",
        ]);

        assert_eq!(
            resolve(&text),
            NetResolution::new(dec("2104.88"), NetSource::PayeeContext)
        );
    }

    #[test]
    fn test_payee_context_out_of_range_falls_through() {
        let text = spaced(&["payee: $250,000.00", "net pay: $1,000.00"]);

        assert_eq!(
            resolve(&text),
            NetResolution::new(dec("1000.00"), NetSource::GenericPattern)
        );
    }

    #[test]
    fn test_configured_payee_marker() {
        let mut config = ExtractionConfig::default();
        config.payee_markers = vec!["Alex Rivera".to_string()];
        let text = spaced(&["ALEX RIVERA  xxxxx1234  $1,876.40", "net pay $1.00"]);

        assert_eq!(
            resolve_with(&text, &config),
            NetResolution::new(dec("1876.40"), NetSource::PayeeContext)
        );
    }

    #[test]
    fn test_post_tax_deductions_total() {
        let text = spaced(&[
            "gross pay $5,000.00",
            "bonus $4,000.00",
            "post-tax deductions $125.00 $2,345.67",
        ]);

        assert_eq!(
            resolve(&text),
            NetResolution::new(dec("2345.67"), NetSource::PriorityContext)
        );
    }

    #[test]
    fn test_currency_unit_marker() {
        let text = spaced(&["gross pay $5,000.00", "the sum of $3,120.05 dollars"]);

        assert_eq!(
            resolve(&text),
            NetResolution::new(dec("3120.05"), NetSource::PriorityContext)
        );
    }

    #[test]
    fn test_largest_candidate_below_gross() {
        let text = spaced(&[
            "gross pay $5,000.00",
            "federal income tax $600.00",
            "medicare taxable wages $4,800.00",
            "deposit to checking $3,200.00",
            "ytd gross $60,000.00",
            "parking $50.00",
        ]);

        assert_eq!(
            resolve(&text),
            NetResolution::new(dec("3200.00"), NetSource::LargestCandidate)
        );
    }

    #[test]
    fn test_amount_above_gross_is_never_net() {
        let text = spaced(&["gross pay $2,000.00", "ytd net $24,000.00", "transfer $1,500.00"]);

        let resolved = resolve(&text);
        assert_eq!(resolved.value, dec("1500.00"));
        assert_eq!(resolved.source, NetSource::LargestCandidate);
    }

    #[test]
    fn test_candidate_equal_to_gross_is_rejected() {
        let text = spaced(&["gross pay $2,000.00", "deposit $2,000.00"]);
        assert_eq!(
            resolve(&text),
            NetResolution::new(Decimal::ZERO, NetSource::NotFound)
        );

        let text = spaced(&["gross pay $2,000.00", "deposit $2,000.00", "transfer $1,999.99"]);
        assert_eq!(
            resolve(&text),
            NetResolution::new(dec("1999.99"), NetSource::LargestCandidate)
        );
    }

    #[test]
    fn test_noise_floor_is_exclusive() {
        let text = spaced(&["gross pay $2,000.00", "fee $100.00"]);
        assert_eq!(
            resolve(&text),
            NetResolution::new(Decimal::ZERO, NetSource::NotFound)
        );

        let text = spaced(&["gross pay $2,000.00", "fee $100.01"]);
        assert_eq!(
            resolve(&text),
            NetResolution::new(dec("100.01"), NetSource::LargestCandidate)
        );
    }

    #[test]
    fn test_denylisted_word_at_window_edge() {
        let mut config = ExtractionConfig::default();
        config.context_window = 10;

        // Ten characters before the amount: "federal   " is inside, "ederal    " is not.
        let inside = spaced(&["gross pay $2,000.00", "federal   $1,500.00"]);
        let outside = spaced(&["gross pay $2,000.00", "federal    $1,500.00"]);
        assert_eq!(resolve_with(&inside, &config).source, NetSource::NotFound);
        assert_eq!(
            resolve_with(&outside, &config),
            NetResolution::new(dec("1500.00"), NetSource::LargestCandidate)
        );

        // Same edge after the amount.
        let inside = spaced(&["gross pay $2,000.00", "$1,500.00  medicare"]);
        let outside = spaced(&["gross pay $2,000.00", "$1,500.00   medicare"]);
        assert_eq!(resolve_with(&inside, &config).source, NetSource::NotFound);
        assert_eq!(
            resolve_with(&outside, &config),
            NetResolution::new(dec("1500.00"), NetSource::LargestCandidate)
        );
    }

    #[test]
    fn test_custom_bounds() {
        let mut config = ExtractionConfig::default();
        config.noise_floor = Decimal::from(2000);
        let text = spaced(&["gross pay $5,000.00", "deposit $1,500.00", "net pay $1,400.00"]);

        assert_eq!(
            resolve_with(&text, &config),
            NetResolution::new(dec("1400.00"), NetSource::GenericPattern)
        );
    }

    #[test]
    fn test_generic_keeps_largest_across_patterns() {
        let text = "net pay $1,500.00\ntake home $1,650.00";

        assert_eq!(
            resolve(text),
            NetResolution::new(dec("1650.00"), NetSource::GenericPattern)
        );
    }

    #[test]
    fn test_generic_net_pay_label() {
        assert_eq!(
            resolve("NET PAY: $3,515.91"),
            NetResolution::new(dec("3515.91"), NetSource::GenericPattern)
        );
    }

    #[test]
    fn test_not_found() {
        assert_eq!(
            resolve("nothing useful here"),
            NetResolution::new(Decimal::ZERO, NetSource::NotFound)
        );
    }

    #[test]
    fn test_surrounding_clamps_and_respects_chars() {
        let text = "ééé $10.00 abc";
        let start = text.find('$').unwrap();
        let end = start + "$10.00".len();

        assert_eq!(surrounding(text, start, end, 2), "é $10.00 a");
        assert_eq!(surrounding(text, start, end, 100), text);
        assert_eq!(surrounding(text, start, end, 0), "$10.00");
    }
}
