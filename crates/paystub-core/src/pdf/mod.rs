//! PDF text layer and embedded image access.

mod extractor;

pub use extractor::{PdfAnalysis, PdfDocument};

use crate::error::PdfError;

/// Kind of content a PDF carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfType {
    /// Usable text layer, no images.
    Text,
    /// Images only (scanned statement).
    Image,
    /// Text layer and images.
    Hybrid,
    /// Nothing usable.
    Empty,
}

impl PdfType {
    /// Classify from whether a usable text layer and images were found.
    pub fn classify(has_text: bool, has_images: bool) -> Self {
        match (has_text, has_images) {
            (true, false) => PdfType::Text,
            (false, true) => PdfType::Image,
            (true, true) => PdfType::Hybrid,
            (false, false) => PdfType::Empty,
        }
    }

    /// Whether OCR of the page images is needed to get text.
    pub fn needs_ocr(&self) -> bool {
        matches!(self, PdfType::Image)
    }
}

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;
