//! OCR of scanned pay statements.
//!
//! The engine itself lives behind the `native` feature. The result types are
//! always available so text-only builds can still feed [`OcrResult`] values
//! into the extractor.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::{create_engine_from_dir, OcrEngine};

use serde::{Deserialize, Serialize};

/// A recognized text box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Quadrilateral corners `(x1, y1, ..., x4, y4)`.
    pub bbox: [f32; 8],

    /// Recognized text.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Axis-aligned bounding rectangle `(min_x, min_y, max_x, max_y)`.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }

    /// Vertical center of the box.
    pub fn center_y(&self) -> f32 {
        let (_, min_y, _, max_y) = self.rect();
        (min_y + max_y) / 2.0
    }
}

/// Result of OCR on one image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResult {
    /// Recognized boxes, in reading order once sorted.
    pub boxes: Vec<TextBox>,

    /// Full text: boxes of a row joined by spaces, rows by newlines.
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrResult {
    /// Wrap text that did not come from an image.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Sort boxes top-to-bottom, left-to-right and rebuild `text`.
    ///
    /// Boxes whose vertical centers are within `row_tolerance` pixels of the
    /// first box of a row belong to that row. A label and its amount usually
    /// land on the same row, which keeps them adjacent in the text.
    pub fn sort_by_reading_order(&mut self, row_tolerance: f32) {
        self.boxes.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()));

        let mut rows: Vec<Vec<TextBox>> = Vec::new();
        for text_box in self.boxes.drain(..) {
            let row_y = rows.last().map(|row| row[0].center_y());
            match (rows.last_mut(), row_y) {
                (Some(row), Some(y)) if (text_box.center_y() - y).abs() <= row_tolerance => {
                    row.push(text_box)
                }
                _ => rows.push(vec![text_box]),
            }
        }

        for row in &mut rows {
            row.sort_by(|a, b| a.rect().0.total_cmp(&b.rect().0));
        }

        self.text = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| b.text.trim())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        self.boxes = rows.into_iter().flatten().collect();
    }
}
