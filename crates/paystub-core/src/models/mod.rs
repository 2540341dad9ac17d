//! Data models: the extracted record and pipeline configuration.

pub mod config;
pub mod statement;

pub use config::{CustomPattern, ExtractionConfig, ModelConfig, OcrConfig, PaystubConfig, PdfConfig};
pub use statement::{PayStatement, SOURCE_SYSTEM};
