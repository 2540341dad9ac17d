//! Core library for pay statement field extraction.
//!
//! This crate provides:
//! - Rule-based extraction of pay, tax and deduction fields from statement text
//! - The flat `PayStatement` record and its JSON shape
//! - PDF text layer and embedded image access
//! - OCR of scanned statements via `pure-onnx-ocr` (feature `native`)

pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pdf;

pub use error::{PaystubError, Result};
pub use extract::rules::{FieldKey, NetResolution, NetSource, PatternCatalog, PatternList};
pub use extract::{ExtractionResult, PaystubParser, StatementExtractor, StatementParser};
pub use models::{ExtractionConfig, PayStatement, PaystubConfig};
pub use ocr::{OcrResult, TextBox};
#[cfg(feature = "native")]
pub use ocr::{create_engine_from_dir, OcrEngine};
pub use pdf::{PdfAnalysis, PdfDocument, PdfType};
