//! PDF loading with lopdf and text extraction with pdf-extract.

use std::path::Path;

use image::{DynamicImage, ImageBuffer, Luma, Rgb};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{PdfType, Result};
use crate::error::PdfError;
use crate::models::config::PdfConfig;

/// A loaded, decrypted PDF.
pub struct PdfDocument {
    document: Document,
    /// Bytes handed to pdf-extract (re-saved when the file was decrypted).
    raw_data: Vec<u8>,
    min_text_length: usize,
}

/// Summary of what a PDF contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfAnalysis {
    pub pdf_type: PdfType,
    pub page_count: u32,
    /// Non-whitespace characters in the text layer.
    pub text_chars: usize,
    pub image_count: usize,
}

impl PdfDocument {
    /// Read and load a PDF file.
    pub fn open(path: &Path, config: &PdfConfig) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| PdfError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::load(&data, config)
    }

    /// Load a PDF from bytes, decrypting it when it uses an empty password.
    pub fn load(data: &[u8], config: &PdfConfig) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if document.is_encrypted() {
            document.decrypt("").map_err(|_| PdfError::Encrypted)?;
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        if document.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", document.get_pages().len());

        Ok(Self {
            document,
            raw_data,
            min_text_length: config.min_text_length,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Text layer of the whole document.
    pub fn extract_text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Classify the document from its extracted text layer and the number
    /// of decodable images.
    pub fn analyze(&self, text: &str, image_count: usize) -> PdfAnalysis {
        let text_chars = count_visible(text);

        let analysis = PdfAnalysis {
            pdf_type: PdfType::classify(text_chars >= self.min_text_length, image_count > 0),
            page_count: self.page_count(),
            text_chars,
            image_count,
        };

        debug!("PDF analysis: {:?}", analysis);
        analysis
    }

    /// Decodable images of one page (1-indexed).
    pub fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let pages = self.document.get_pages();
        let page_id = pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut images = Vec::new();
        let Some(resources) = self.page_resources(*page_id) else {
            return Ok(images);
        };

        if let Ok(xobjects) = resources.get(b"XObject") {
            if let Ok((_, Object::Dictionary(xobjects))) = self.document.dereference(xobjects) {
                for (_, reference) in xobjects.iter() {
                    if let Ok((_, object)) = self.document.dereference(reference) {
                        images.extend(self.decode_image(object));
                    }
                }
            }
        }

        trace!("Page {} has {} decodable images", page, images.len());
        Ok(images)
    }

    /// Images of every page in page order.
    ///
    /// Falls back to scanning every object when no page references an image
    /// through its resources.
    pub fn images(&self) -> Vec<DynamicImage> {
        let mut images: Vec<DynamicImage> = (1..=self.page_count())
            .flat_map(|page| self.page_images(page).unwrap_or_default())
            .collect();

        if images.is_empty() {
            images = self
                .document
                .objects
                .values()
                .filter_map(|object| self.decode_image(object))
                .collect();
            debug!("Found {} images by scanning all objects", images.len());
        }

        images
    }

    /// Resources of a page, walking up the page tree for inherited ones.
    fn page_resources(&self, node_id: ObjectId) -> Option<Dictionary> {
        let Ok(Object::Dictionary(node)) = self.document.get_object(node_id) else {
            return None;
        };

        if let Ok(resources) = node.get(b"Resources") {
            if let Ok((_, Object::Dictionary(resources))) = self.document.dereference(resources) {
                return Some(resources.clone());
            }
        }

        match node.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_resources(*parent_id),
            _ => None,
        }
    }

    fn decode_image(&self, object: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = object else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;

        let filter = dict.get(b"Filter").ok().and_then(|f| match f {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(filters) => filters.first().and_then(|o| o.as_name().ok()),
            _ => None,
        });

        match filter {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Skipping unsupported image filter {:?}", filter.map(String::from_utf8_lossy));
                return None;
            }
            _ => {}
        }

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            trace!("Skipping image with {} bits per component", bits);
            return None;
        }

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(entries) => entries.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self.document.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        raw_to_image(&data, width, height, color_space)
    }
}

/// Build an image from uncompressed 8-bit samples.
fn raw_to_image(data: &[u8], width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = (width as usize) * (height as usize);

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, data[..pixels * 3].to_vec())
                .map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            ImageBuffer::<Luma<u8>, _>::from_raw(width, height, data[..pixels].to_vec())
                .map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode {}x{} image in {} ({} bytes)",
                width,
                height,
                String::from_utf8_lossy(color_space),
                data.len()
            );
            None
        }
    }
}

fn count_visible(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}
