use std::path::Path;
use std::process::Stdio;

use bytes::Bytes;
use tokio::process::Command;
use tracing::debug;

use crate::errors::AppError;
use crate::pdf::PageImage;

/// 1.5x scale over the 72 dpi PDF baseline.
const RENDER_DPI: u32 = 108;
const OUTPUT_PREFIX: &str = "page";

/// Renders every page to PNG with `pdftoppm` inside a scratch directory.
pub struct PdftoppmRenderer {
    program: String,
}

impl PdftoppmRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub async fn render(&self, pdf: &Bytes) -> Result<Vec<PageImage>, AppError> {
        let scratch = tempfile::tempdir().map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to create scratch dir: {e}"))
        })?;
        let input = scratch.path().join("input.pdf");
        tokio::fs::write(&input, pdf)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to stage upload: {e}")))?;

        let output = Command::new(&self.program)
            .arg("-png")
            .arg("-r")
            .arg(RENDER_DPI.to_string())
            .arg(&input)
            .arg(scratch.path().join(OUTPUT_PREFIX))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| AppError::Conversion(format!("Failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Conversion(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let pages = collect_pages(scratch.path()).await?;
        if pages.is_empty() {
            return Err(AppError::Conversion("PDF has no renderable pages".to_string()));
        }
        debug!("Rendered {} pages at {} dpi", pages.len(), RENDER_DPI);
        Ok(pages)
    }
}

/// Reads `page-<n>.png` files back in page order. pdftoppm zero-pads `<n>`
/// depending on the page count, so the number is parsed rather than sorted as text.
async fn collect_pages(dir: &Path) -> Result<Vec<PageImage>, AppError> {
    let io_err = |e: std::io::Error| {
        AppError::Internal(anyhow::anyhow!("Failed to read rendered pages: {e}"))
    };

    let mut numbered = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if let Some(page) = page_number(&file_name) {
            numbered.push((page, entry.path()));
        }
    }
    numbered.sort_by_key(|(page, _)| *page);

    let mut pages = Vec::with_capacity(numbered.len());
    for (page, path) in numbered {
        let png = tokio::fs::read(&path).await.map_err(io_err)?;
        pages.push(PageImage {
            page,
            png: Bytes::from(png),
        });
    }
    Ok(pages)
}

fn page_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(OUTPUT_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".png")?
        .parse()
        .ok()
}
