//! Turning input files into statement text.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use image::DynamicImage;
use tracing::{debug, info, warn};

use paystub_core::models::config::PaystubConfig;
use paystub_core::pdf::{PdfDocument, PdfType};
use paystub_core::{create_engine_from_dir, OcrEngine};

/// Image extensions handed to OCR.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "tif", "bmp", "webp"];

/// How an input file is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Already decoded text.
    Text,
    Pdf,
    Image,
}

impl SourceKind {
    /// Classify by extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "txt" => Some(SourceKind::Text),
            "pdf" => Some(SourceKind::Pdf),
            ext if IMAGE_EXTENSIONS.contains(&ext) => Some(SourceKind::Image),
            _ => None,
        }
    }
}

/// Where the text of a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOrigin {
    PlainText,
    PdfTextLayer,
    PdfOcr,
    ImageOcr,
}

impl std::fmt::Display for TextOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TextOrigin::PlainText => "plain text",
            TextOrigin::PdfTextLayer => "PDF text layer",
            TextOrigin::PdfOcr => "OCR of PDF images",
            TextOrigin::ImageOcr => "OCR of image",
        };
        f.write_str(name)
    }
}

/// Text recovered from one document.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub text: String,
    pub origin: TextOrigin,
}

/// Reads documents of any supported kind into text.
#[derive(Debug, Clone)]
pub struct Ingestor {
    config: PaystubConfig,
    model_dir: PathBuf,
    text_only: bool,
}

impl Ingestor {
    pub fn new(config: PaystubConfig, model_dir: Option<PathBuf>, text_only: bool) -> Self {
        let model_dir = model_dir.unwrap_or_else(|| config.models.model_dir.clone());
        Self {
            config,
            model_dir,
            text_only,
        }
    }

    /// Read a document. Fails when the format is unsupported or no text
    /// could be recovered.
    pub fn read(&self, path: &Path) -> anyhow::Result<Ingested> {
        let kind = SourceKind::from_path(path)
            .with_context(|| format!("unsupported file format: {}", path.display()))?;

        info!("Reading {} as {:?}", path.display(), kind);

        let ingested = match kind {
            SourceKind::Text => Ingested {
                text: fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                origin: TextOrigin::PlainText,
            },
            SourceKind::Pdf => self.read_pdf(path)?,
            SourceKind::Image => {
                if self.text_only {
                    anyhow::bail!("{} is an image but --text-only was set", path.display());
                }
                let image = image::open(path)
                    .with_context(|| format!("failed to open image {}", path.display()))?;
                Ingested {
                    text: self.ocr(&[image])?,
                    origin: TextOrigin::ImageOcr,
                }
            }
        };

        if ingested.text.trim().is_empty() {
            anyhow::bail!("could not extract text from {}", path.display());
        }

        debug!(
            "Recovered {} characters from {} via {}",
            ingested.text.len(),
            path.display(),
            ingested.origin
        );
        Ok(ingested)
    }

    fn read_pdf(&self, path: &Path) -> anyhow::Result<Ingested> {
        let document = PdfDocument::open(path, &self.config.pdf)?;

        let text = document.extract_text().unwrap_or_else(|e| {
            warn!("Text layer extraction failed for {}: {}", path.display(), e);
            String::new()
        });
        let images = if self.text_only {
            Vec::new()
        } else {
            document.images()
        };

        let analysis = document.analyze(&text, images.len());
        info!(
            "{} is a {:?} PDF ({} pages, {} text characters, {} images)",
            path.display(),
            analysis.pdf_type,
            analysis.page_count,
            analysis.text_chars,
            analysis.image_count
        );

        let text_layer = Ingested {
            text,
            origin: TextOrigin::PdfTextLayer,
        };
        if images.is_empty() {
            if analysis.pdf_type == PdfType::Empty && !self.text_only {
                warn!("No usable text and no images to OCR in {}", path.display());
            }
            return Ok(text_layer);
        }
        if self.config.pdf.prefer_embedded_text && !analysis.pdf_type.needs_ocr() {
            return Ok(text_layer);
        }

        debug!("Running OCR on {} page images", images.len());
        Ok(Ingested {
            text: self.ocr(&images)?,
            origin: TextOrigin::PdfOcr,
        })
    }

    fn ocr(&self, images: &[DynamicImage]) -> anyhow::Result<String> {
        let engine = self.engine()?;

        let mut pages = Vec::with_capacity(images.len());
        for (i, image) in images.iter().enumerate() {
            match engine.extract_text(image) {
                Ok(text) if !text.trim().is_empty() => pages.push(text),
                Ok(_) => debug!("No text detected in image {}", i + 1),
                Err(e) => warn!("OCR failed for image {}: {}", i + 1, e),
            }
        }

        Ok(pages.join("\n\n"))
    }

    fn engine(&self) -> anyhow::Result<OcrEngine> {
        if !self.config.models.available_in(&self.model_dir) {
            anyhow::bail!(
                "OCR models not found in {}. Expected {} and {}.",
                self.model_dir.display(),
                self.config.models.detection_model,
                self.config.models.recognition_model
            );
        }

        create_engine_from_dir(&self.model_dir, &self.config.models, self.config.ocr.clone())
            .with_context(|| format!("failed to load OCR models from {}", self.model_dir.display()))
    }
}
