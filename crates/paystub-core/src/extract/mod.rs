//! Pay statement field extraction module.

mod parser;
pub mod rules;

pub use parser::{ExtractionResult, PaystubParser, StatementParser};

use crate::error::ExtractionError;
use crate::models::statement::PayStatement;
use crate::ocr::OcrResult;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for pay statement field extractors.
pub trait StatementExtractor {
    /// Extract a record from an OCR result.
    fn extract(&self, ocr_result: &OcrResult) -> Result<PayStatement>;

    /// Extract a record from already decoded text.
    fn extract_from_text(&self, text: &str) -> Result<PayStatement>;
}
