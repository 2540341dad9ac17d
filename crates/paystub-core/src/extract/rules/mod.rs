//! Rule-based field resolution for pay statements.

pub mod amounts;
pub mod catalog;
pub mod dates;
pub mod net;
pub mod patterns;

pub use amounts::{dollar_candidates, extract_amount, normalize_amount, AmountCandidate};
pub use catalog::{FieldKey, PatternCatalog, PatternList};
pub use dates::{extract_date, extract_pay_period, reformat_us_date};
pub use net::{NetResolution, NetResolver, NetSource};

/// A value captured by a catalog pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMatch<T> {
    /// Captured value.
    pub value: T,
    /// Index of the pattern within its list.
    pub pattern_index: usize,
}

impl<T> FieldMatch<T> {
    pub fn new(value: T, pattern_index: usize) -> Self {
        Self {
            value,
            pattern_index,
        }
    }
}
