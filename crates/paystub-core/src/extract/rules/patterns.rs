//! Regex fragments shared by the pattern catalog.
//!
//! Catalog entries are written as templates with `<amt>`, `<sep>`, `<date>`
//! and `<range>` placeholders, expanded by [`expand`] before compilation.
//! All fragments assume lower-cased input.

use lazy_static::lazy_static;
use regex::Regex;

/// Money value, captured as group 1.
///
/// Accepts `1,234.56` and bare integers, plus the OCR renderings where
/// separators are read as spaces: `1 234.56` (comma lost), `1 234 56` and
/// `1234 56` (decimal point lost, cents kept as a trailing two digit group).
pub const AMOUNT: &str = concat!(
    r"(-?(?:",
    r"\d[\d,]*\.\d{2}",
    r"|\d{1,3}(?: \d{3})+\.\d{2}",
    r"|\d{1,3}(?: \d{3})* \d{2}\b",
    r"|\d+ \d{2}\b",
    r"|\d[\d,]*",
    r"))"
);

/// Separator between a label and its value: optional colon and dollar sign.
pub const LABEL_SEPARATOR: &str = r"\s*:?\s*\$?\s*";

/// `MM/DD/YYYY`, captured as group 1.
pub const DATE_MDY: &str = r"(\d{1,2}/\d{1,2}/\d{4})";

/// Two `MM/DD/YYYY` dates joined by a dash or a word, captured as group 1.
pub const DATE_RANGE: &str =
    r"(\d{1,2}/\d{1,2}/\d{4}\s*(?:-|–|to|through|thru)\s*\d{1,2}/\d{1,2}/\d{4})";

/// `401k` in its common spellings.
const PLAN_401K: &str = r"401\s?\(?k\)?";

lazy_static! {
    /// Any dollar-prefixed amount, used for net pay candidate collection.
    pub static ref DOLLAR_AMOUNT: Regex = Regex::new(&format!(r"\$\s?{}", AMOUNT)).unwrap();
}

/// Expand the placeholders of a catalog template into a regex source.
pub fn expand(template: &str) -> String {
    template
        .replace("<sep>", LABEL_SEPARATOR)
        .replace("<amt>", AMOUNT)
        .replace("<range>", DATE_RANGE)
        .replace("<date>", DATE_MDY)
        .replace("<401k>", PLAN_401K)
}
