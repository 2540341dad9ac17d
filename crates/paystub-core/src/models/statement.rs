//! Pay statement record produced by the field extractor.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Provenance marker stamped on every record.
pub const SOURCE_SYSTEM: &str = "OCR";

/// Flat record of the fields extracted from one pay statement.
///
/// Every key is always present. Money values serialize as JSON numbers and
/// default to `0.0`; dates are `YYYY-MM-DD` strings (or whatever raw text the
/// document held) and default to an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayStatement {
    /// Raw pay period range, e.g. `12/14/2025 - 12/27/2025`.
    pub pay_period: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub gross_amount: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub net_amount: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub federal_tax_amount: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub state_tax_amount: Decimal,

    /// Local taxes are not extracted.
    #[serde(with = "rust_decimal::serde::float")]
    pub local_tax_amount: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub employee_fsa_contribution: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub medicare_amount: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub social_security_amount: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub employee_401k_contribution: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub employer_401k_match: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub employee_hsa_contribution: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub employer_hsa_match: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub employer_fsa_match: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub health_insurance: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub dental_insurance: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub vision_insurance: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub other_pre_tax_deductions: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub garnishments: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub other_post_tax_deductions: Decimal,

    /// Pay date as `YYYY-MM-DD` when the document used `MM/DD/YYYY`.
    pub pay_date: String,

    /// Always [`SOURCE_SYSTEM`].
    pub source_system: String,
}

impl Default for PayStatement {
    fn default() -> Self {
        Self {
            pay_period: String::new(),
            gross_amount: Decimal::ZERO,
            net_amount: Decimal::ZERO,
            federal_tax_amount: Decimal::ZERO,
            state_tax_amount: Decimal::ZERO,
            local_tax_amount: Decimal::ZERO,
            employee_fsa_contribution: Decimal::ZERO,
            medicare_amount: Decimal::ZERO,
            social_security_amount: Decimal::ZERO,
            employee_401k_contribution: Decimal::ZERO,
            employer_401k_match: Decimal::ZERO,
            employee_hsa_contribution: Decimal::ZERO,
            employer_hsa_match: Decimal::ZERO,
            employer_fsa_match: Decimal::ZERO,
            health_insurance: Decimal::ZERO,
            dental_insurance: Decimal::ZERO,
            vision_insurance: Decimal::ZERO,
            other_pre_tax_deductions: Decimal::ZERO,
            garnishments: Decimal::ZERO,
            other_post_tax_deductions: Decimal::ZERO,
            pay_date: String::new(),
            source_system: SOURCE_SYSTEM.to_string(),
        }
    }
}

impl PayStatement {
    /// Sum of all tax withholdings.
    pub fn total_taxes(&self) -> Decimal {
        self.federal_tax_amount
            + self.state_tax_amount
            + self.local_tax_amount
            + self.medicare_amount
            + self.social_security_amount
    }

    /// Sum of employee-side deductions (employer matches excluded).
    pub fn total_deductions(&self) -> Decimal {
        self.employee_401k_contribution
            + self.employee_hsa_contribution
            + self.employee_fsa_contribution
            + self.health_insurance
            + self.dental_insurance
            + self.vision_insurance
            + self.other_pre_tax_deductions
            + self.garnishments
            + self.other_post_tax_deductions
    }

    /// Parse the pay date, if it is in ISO form.
    pub fn pay_date_parsed(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.pay_date, "%Y-%m-%d").ok()
    }

    /// Check whether the pay date falls in the given year and month.
    pub fn is_paid_in(&self, year: i32, month: u32) -> bool {
        self.pay_date_parsed()
            .map(|d| d.year() == year && d.month() == month)
            .unwrap_or(false)
    }

    /// Validate the record and return a list of issues.
    ///
    /// Issues are advisory: extraction is heuristic, so an inconsistent
    /// record is still returned to the caller.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.gross_amount.is_zero() {
            issues.push("Gross amount was not found".to_string());
        }

        if self.net_amount.is_zero() {
            issues.push("Net amount was not found".to_string());
        }

        if !self.gross_amount.is_zero() && self.net_amount > self.gross_amount {
            issues.push(format!(
                "Net amount {} exceeds gross amount {}",
                self.net_amount, self.gross_amount
            ));
        }

        let withheld = self.total_taxes() + self.total_deductions();
        if !self.gross_amount.is_zero() && withheld > self.gross_amount {
            issues.push(format!(
                "Taxes and deductions {} exceed gross amount {}",
                withheld, self.gross_amount
            ));
        }

        if !self.pay_date.is_empty() && self.pay_date_parsed().is_none() {
            issues.push(format!("Pay date '{}' is not a valid date", self.pay_date));
        }

        issues
    }
}
