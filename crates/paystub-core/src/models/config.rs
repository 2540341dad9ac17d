//! Configuration structures for the extraction pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{PaystubError, Result};
use crate::extract::rules::catalog::FieldKey;

/// Main configuration for the paystub pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaystubConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// Model configuration.
    pub models: ModelConfig,
}

/// Field extraction configuration.
///
/// The numeric bounds and the context denylist drive the net pay
/// disambiguation chain. They were tuned on a handful of statement styles;
/// adjust them per employer rather than trusting the defaults blindly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Phrases that identify the payee block. A dollar amount shortly after
    /// one of these is taken as net pay.
    pub payee_markers: Vec<String>,

    /// Words that disqualify a net pay candidate when they appear near it.
    pub context_denylist: Vec<String>,

    /// Exclusive upper bound for a plausible net pay value.
    pub plausible_max: Decimal,

    /// Candidates at or below this value are treated as noise.
    pub noise_floor: Decimal,

    /// Characters inspected on each side of a candidate amount.
    pub context_window: usize,

    /// Emit a trace event for every rejected net pay candidate.
    pub trace_candidates: bool,

    /// Extra patterns appended after the built-in patterns of a field.
    pub custom_patterns: Vec<CustomPattern>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            payee_markers: vec!["pay to the order of".to_string(), "payee".to_string()],
            context_denylist: vec![
                "taxable".to_string(),
                "federal".to_string(),
                "medicare".to_string(),
            ],
            plausible_max: Decimal::from(100_000),
            noise_floor: Decimal::from(100),
            context_window: 100,
            trace_candidates: false,
            custom_patterns: Vec::new(),
        }
    }
}

/// A user supplied pattern for one field.
///
/// The pattern is matched against lower-cased text and must contain one
/// capture group holding the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPattern {
    /// Field the pattern resolves.
    pub field: FieldKey,
    /// Regular expression source.
    pub pattern: String,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Try to extract embedded text before falling back to OCR.
    pub prefer_embedded_text: bool,

    /// Minimum text length to consider PDF as text-based.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            prefer_embedded_text: true,
            min_text_length: 50,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Keep `[UNK]` markers emitted by the recognizer instead of blanking them.
    pub keep_unk: bool,

    /// Vertical distance in pixels under which two boxes share a text row.
    pub row_tolerance: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            keep_unk: false,
            row_tolerance: 20.0,
        }
    }
}

/// Model file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

impl ModelConfig {
    /// Check that the detection and recognition models exist in `dir`.
    pub fn available_in(&self, dir: &std::path::Path) -> bool {
        dir.join(&self.detection_model).exists() && dir.join(&self.recognition_model).exists()
    }
}

impl PaystubConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| PaystubError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PaystubError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
