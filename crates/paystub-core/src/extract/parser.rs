//! Pay statement parser assembling a full record from raw text.

use std::time::Instant;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::statement::PayStatement;
use crate::ocr::OcrResult;

use super::rules::{
    amounts, dates, FieldKey, NetResolution, NetResolver, NetSource, PatternCatalog,
};
use super::{Result, StatementExtractor};

/// Result of parsing one pay statement.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted record.
    pub statement: PayStatement,
    /// Tier of the net pay chain that produced `net_amount`.
    pub net_source: NetSource,
    /// Missing fields and consistency issues.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for pay statement parsing.
pub trait StatementParser {
    /// Parse a pay statement from text.
    fn parse(&self, text: &str) -> Result<ExtractionResult>;
}

/// Rule-based pay statement parser.
///
/// Owns its compiled [`PatternCatalog`] and never mutates it, so one parser
/// can be shared across threads.
#[derive(Debug, Clone)]
pub struct PaystubParser {
    catalog: PatternCatalog,
    config: ExtractionConfig,
}

impl PaystubParser {
    /// Create a parser with the built-in catalog and default bounds.
    pub fn new() -> Result<Self> {
        Self::from_config(&ExtractionConfig::default())
    }

    /// Create a parser from extraction settings, compiling custom patterns.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let catalog = PatternCatalog::from_config(config)?;
        debug!(
            "Compiled pattern catalog with {} custom patterns",
            config.custom_patterns.len()
        );
        Ok(Self {
            catalog,
            config: config.clone(),
        })
    }

    /// Enable per-candidate tracing of the net pay chain.
    pub fn with_trace_candidates(mut self, enabled: bool) -> Self {
        self.config.trace_candidates = enabled;
        self
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Resolve one money field with the first-match strategy.
    pub fn extract_amount(&self, text: &str, key: FieldKey) -> Decimal {
        amounts::extract_amount(&self.catalog, key, &text.to_lowercase())
    }

    /// Resolve one date field, rewritten to `YYYY-MM-DD` when possible.
    pub fn extract_date(&self, text: &str, key: FieldKey) -> String {
        dates::extract_date(&self.catalog, key, &text.to_lowercase())
    }

    /// Resolve the raw pay period range.
    pub fn extract_pay_period(&self, text: &str) -> String {
        dates::extract_pay_period(&self.catalog, &text.to_lowercase())
    }

    /// Run the net pay chain.
    pub fn resolve_net_amount(&self, text: &str) -> NetResolution {
        NetResolver::new(&self.catalog, &self.config).resolve(&text.to_lowercase())
    }

    /// Build a record from text without the empty-input check.
    ///
    /// Blank text yields a record of defaults.
    pub fn extract_fields(&self, text: &str) -> PayStatement {
        self.assemble(&text.to_lowercase()).0
    }

    fn assemble(&self, lowered: &str) -> (PayStatement, NetSource) {
        let amount = |key| amounts::extract_amount(&self.catalog, key, lowered);
        let net = NetResolver::new(&self.catalog, &self.config).resolve(lowered);

        let statement = PayStatement {
            pay_period: dates::extract_pay_period(&self.catalog, lowered),
            gross_amount: amount(FieldKey::GrossAmount),
            net_amount: net.value,
            federal_tax_amount: amount(FieldKey::FederalTax),
            state_tax_amount: amount(FieldKey::StateTax),
            employee_fsa_contribution: amount(FieldKey::EmployeeFsa),
            medicare_amount: amount(FieldKey::Medicare),
            social_security_amount: amount(FieldKey::SocialSecurity),
            employee_401k_contribution: amount(FieldKey::Employee401k),
            employer_401k_match: amount(FieldKey::Employer401kMatch),
            employee_hsa_contribution: amount(FieldKey::EmployeeHsa),
            employer_hsa_match: amount(FieldKey::EmployerHsaMatch),
            employer_fsa_match: amount(FieldKey::EmployerFsaMatch),
            health_insurance: amount(FieldKey::HealthInsurance),
            dental_insurance: amount(FieldKey::DentalInsurance),
            vision_insurance: amount(FieldKey::VisionInsurance),
            pay_date: dates::extract_date(&self.catalog, FieldKey::PayDate, lowered),
            ..PayStatement::default()
        };

        (statement, net.source)
    }
}

impl StatementParser for PaystubParser {
    fn parse(&self, text: &str) -> Result<ExtractionResult> {
        let start = Instant::now();

        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyText);
        }

        info!("Parsing pay statement from {} characters of text", text.len());

        let (statement, net_source) = self.assemble(&text.to_lowercase());

        let mut warnings = Vec::new();
        if statement.pay_date.is_empty() {
            warnings.push("Could not extract pay date".to_string());
        }
        if statement.pay_period.is_empty() {
            warnings.push("Could not extract pay period".to_string());
        }
        warnings.extend(statement.validate());

        for warning in &warnings {
            debug!("{}", warning);
        }

        Ok(ExtractionResult {
            statement,
            net_source,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

impl StatementExtractor for PaystubParser {
    fn extract(&self, ocr_result: &OcrResult) -> Result<PayStatement> {
        debug!(
            "Extracting from {} OCR boxes ({}ms of OCR)",
            ocr_result.boxes.len(),
            ocr_result.processing_time_ms
        );
        self.parse(&ocr_result.text).map(|r| r.statement)
    }

    fn extract_from_text(&self, text: &str) -> Result<PayStatement> {
        self.parse(text).map(|r| r.statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    const SAMPLE: &str = r#"
    PAY STATEMENT
    Pay Period: 12/14/2025 - 12/27/2025
    Pay Date: 01/02/2026

    GROSS PAY: $5,971.61
    Federal Tax: $685.12
    State Tax: $0.00
    Social Security: $370.24
    Medicare: $86.59

    401k Employee: $1,313.75
    401k Employer Match: $328.44
    Health Insurance: $0.00

    NET PAY: $3,515.91
    "#;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_sample_statement() {
        let parser = PaystubParser::new().unwrap();
        let result = parser.parse(SAMPLE).unwrap();

        let expected = PayStatement {
            pay_period: "12/14/2025 - 12/27/2025".to_string(),
            gross_amount: dec("5971.61"),
            net_amount: dec("3515.91"),
            federal_tax_amount: dec("685.12"),
            medicare_amount: dec("86.59"),
            social_security_amount: dec("370.24"),
            employee_401k_contribution: dec("1313.75"),
            employer_401k_match: dec("328.44"),
            pay_date: "2026-01-02".to_string(),
            ..PayStatement::default()
        };

        assert_eq!(result.statement, expected);
        assert_eq!(result.net_source, NetSource::LargestCandidate);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_sample_serializes_in_record_order() {
        let parser = PaystubParser::new().unwrap();
        let statement = parser.extract_from_text(SAMPLE).unwrap();
        let json = serde_json::to_string(&statement).unwrap();

        let keys: Vec<&str> = json
            .split(',')
            .filter_map(|part| part.split('"').nth(1))
            .collect();
        assert_eq!(keys.first(), Some(&"pay_period"));
        assert_eq!(keys.get(1), Some(&"gross_amount"));
        assert_eq!(keys.last(), Some(&"source_system"));
        assert!(json.contains(r#""net_amount":3515.91"#));
        assert!(json.contains(r#""source_system":"OCR""#));
    }

    #[test]
    fn test_empty_text_is_rejected() {
        let parser = PaystubParser::new().unwrap();

        assert!(matches!(parser.parse(""), Err(ExtractionError::EmptyText)));
        assert!(matches!(
            parser.extract_from_text(" \n\t "),
            Err(ExtractionError::EmptyText)
        ));
    }

    #[test]
    fn test_extract_fields_on_blank_text_is_default() {
        let parser = PaystubParser::new().unwrap();
        assert_eq!(parser.extract_fields(""), PayStatement::default());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = PaystubParser::new().unwrap();
        let first = parser.parse(SAMPLE).unwrap();
        let second = parser.parse(SAMPLE).unwrap();

        assert_eq!(first.statement, second.statement);
        assert_eq!(first.net_source, second.net_source);
    }

    #[test]
    fn test_gross_label_priority_over_position() {
        let parser = PaystubParser::new().unwrap();
        let text = "Earnings $200.00\nGross Pay $5,971.61";

        assert_eq!(parser.extract_amount(text, FieldKey::GrossAmount), dec("5971.61"));
    }

    #[test]
    fn test_missing_medicare_defaults_to_zero() {
        let parser = PaystubParser::new().unwrap();

        assert_eq!(parser.extract_amount("Medicare: $86.59", FieldKey::Medicare), dec("86.59"));
        assert_eq!(parser.extract_amount("Gross Pay $10.00", FieldKey::Medicare), Decimal::ZERO);
    }

    #[test]
    fn test_net_pay_alone() {
        let parser = PaystubParser::new().unwrap();
        let resolved = parser.resolve_net_amount("NET PAY: $3,515.91");

        assert_eq!(resolved.value, dec("3515.91"));
        assert_eq!(resolved.source, NetSource::GenericPattern);
    }

    #[test]
    fn test_ocr_spaced_amounts() {
        let parser = PaystubParser::new().unwrap();
        let text = "GROSS PAY 5 931 62\nFED WITHHOLDING 298 08\nCHECK DATE 3/6/2026";
        let statement = parser.extract_fields(text);

        assert_eq!(statement.gross_amount, dec("5931.62"));
        assert_eq!(statement.federal_tax_amount, dec("298.08"));
        assert_eq!(statement.pay_date, "2026-03-06");
    }

    #[test]
    fn test_ocr_partially_lost_separators() {
        let parser = PaystubParser::new().unwrap();

        assert_eq!(
            parser.extract_amount("Gross Pay 5 931.62", FieldKey::GrossAmount),
            dec("5931.62")
        );
        assert_eq!(
            parser.extract_amount("Gross Pay 5931 62", FieldKey::GrossAmount),
            dec("5931.62")
        );
        assert_eq!(
            parser.extract_amount("GROSS PAY: $5 931.62", FieldKey::GrossAmount),
            dec("5931.62")
        );
    }

    #[test]
    fn test_trace_candidates_does_not_change_result() {
        let parser = PaystubParser::new().unwrap();
        let traced = PaystubParser::new().unwrap().with_trace_candidates(true);

        assert!(!parser.config().trace_candidates);
        assert!(traced.config().trace_candidates);
        assert_eq!(
            traced.parse(SAMPLE).unwrap().statement,
            parser.parse(SAMPLE).unwrap().statement
        );
    }

    #[test]
    fn test_fixed_fields_stay_zero() {
        let parser = PaystubParser::new().unwrap();
        let statement = parser
            .extract_from_text("Garnishments: $50.00\nLocal Tax: $12.00\nGross Pay $900.00")
            .unwrap();

        assert_eq!(statement.garnishments, Decimal::ZERO);
        assert_eq!(statement.local_tax_amount, Decimal::ZERO);
        assert_eq!(statement.other_pre_tax_deductions, Decimal::ZERO);
        assert_eq!(statement.other_post_tax_deductions, Decimal::ZERO);
        assert_eq!(statement.source_system, "OCR");
    }

    #[test]
    fn test_warnings_for_sparse_statement() {
        let parser = PaystubParser::new().unwrap();
        let result = parser.parse("Gross Pay $900.00").unwrap();

        assert!(result.warnings.contains(&"Could not extract pay date".to_string()));
        assert!(result.warnings.contains(&"Net amount was not found".to_string()));
        assert_eq!(result.net_source, NetSource::NotFound);
    }

    #[test]
    fn test_custom_pattern_from_config() {
        let mut config = ExtractionConfig::default();
        config.custom_patterns.push(crate::models::config::CustomPattern {
            field: FieldKey::VisionInsurance,
            pattern: r"vsn\s+\$?([\d,]+\.\d{2})".to_string(),
        });
        let parser = PaystubParser::from_config(&config).unwrap();

        assert_eq!(parser.extract_fields("VSN $4.10").vision_insurance, dec("4.10"));
    }

    #[test]
    fn test_extract_from_ocr_result() {
        let parser = PaystubParser::new().unwrap();
        let ocr = OcrResult::from_text("Gross Pay $1,000.00\nNet Pay $800.00");

        let statement = parser.extract(&ocr).unwrap();
        assert_eq!(statement.gross_amount, dec("1000.00"));
        assert_eq!(statement.net_amount, dec("800.00"));
    }

    #[test]
    fn test_parser_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PaystubParser>();
    }
}
