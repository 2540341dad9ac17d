//! Pay date and pay period extraction.

use super::catalog::{FieldKey, PatternCatalog};

/// Rewrite `MM/DD/YYYY` as `YYYY-MM-DD`, zero-padding month and day.
///
/// Anything that is not three numeric `/`-separated parts comes back
/// unchanged. The calendar is not checked: `02/30/2026` becomes `2026-02-30`.
pub fn reformat_us_date(raw: &str) -> String {
    let parts: Vec<&str> = raw.split('/').collect();
    let [month, day, year] = parts.as_slice() else {
        return raw.to_string();
    };

    match (
        month.trim().parse::<u32>(),
        day.trim().parse::<u32>(),
        year.trim().parse::<u32>(),
    ) {
        (Ok(month), Ok(day), Ok(_)) => format!("{}-{:02}-{:02}", year.trim(), month, day),
        _ => raw.to_string(),
    }
}

/// Resolve a date field with the first matching pattern.
///
/// Returns an empty string when no pattern matches.
pub fn extract_date(catalog: &PatternCatalog, key: FieldKey, lowered: &str) -> String {
    catalog
        .find_first(key, lowered)
        .map(|m| reformat_us_date(m.value))
        .unwrap_or_default()
}

/// Resolve the pay period range. The matched text is returned as is.
pub fn extract_pay_period(catalog: &PatternCatalog, lowered: &str) -> String {
    catalog
        .find_first(FieldKey::PayPeriod, lowered)
        .map(|m| m.value.to_string())
        .unwrap_or_default()
}
