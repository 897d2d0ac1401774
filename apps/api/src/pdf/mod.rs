// PDF conversion: page images and plain text from an uploaded resume.
// Rendering shells out to poppler's `pdftoppm`; text comes from pdf-extract.

pub mod render;
pub mod text;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::AppError;

/// One rendered page. `page` is 1-indexed.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub page: u32,
    pub png: Bytes,
}

/// The conversion collaborator used by the analysis pipeline.
/// Failures are reported as `AppError::Conversion`.
#[async_trait]
pub trait PdfConverter: Send + Sync {
    async fn to_images(&self, pdf: &Bytes) -> Result<Vec<PageImage>, AppError>;

    async fn extract_text(&self, pdf: &Bytes) -> Result<String, AppError>;
}

/// Production converter: `pdftoppm` for pages, pdf-extract for text.
pub struct PopplerPdfConverter {
    renderer: render::PdftoppmRenderer,
}

impl PopplerPdfConverter {
    pub fn new(pdftoppm_path: impl Into<String>) -> Self {
        Self {
            renderer: render::PdftoppmRenderer::new(pdftoppm_path),
        }
    }
}

#[async_trait]
impl PdfConverter for PopplerPdfConverter {
    async fn to_images(&self, pdf: &Bytes) -> Result<Vec<PageImage>, AppError> {
        self.renderer.render(pdf).await
    }

    async fn extract_text(&self, pdf: &Bytes) -> Result<String, AppError> {
        text::extract_text(pdf.clone()).await
    }
}

/// Human-readable size with binary units, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    let rounded = (size * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}
