//! Analysis pipeline: orchestrates one resume evaluation end to end.
//!
//! Flow: render pages → extract text → AI score → parse → build record →
//!       save remote assets (signed-in users, best-effort) → add to local cache (always).
//!
//! Steps 1-3 abort the run and no record is created. Nothing is retried per
//! step; the user re-submits to retry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use crate::analysis::extract::parse_ai_output;
use crate::analysis::scorer::AtsScorer;
use crate::errors::AppError;
use crate::models::analysis::AnalysisRecord;
use crate::pdf::PdfConverter;
use crate::session::Session;
use crate::storage::assets::AssetStore;
use crate::storage::cache::AnalysisCache;

/// Page images sent to the model per analysis.
pub const MAX_SCORED_PAGES: usize = 2;

#[derive(Debug, Clone)]
pub struct AnalysisUpload {
    pub file_name: String,
    pub file: Bytes,
    pub job_description: String,
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub record: AnalysisRecord,
    pub page_count: usize,
}

pub struct AnalysisPipeline {
    converter: Arc<dyn PdfConverter>,
    scorer: Option<Arc<dyn AtsScorer>>,
    assets: Arc<AssetStore>,
    cache: Arc<AnalysisCache>,
}

impl AnalysisPipeline {
    pub fn new(
        converter: Arc<dyn PdfConverter>,
        scorer: Option<Arc<dyn AtsScorer>>,
        assets: Arc<AssetStore>,
        cache: Arc<AnalysisCache>,
    ) -> Self {
        Self {
            converter,
            scorer,
            assets,
            cache,
        }
    }

    pub fn ai_available(&self) -> bool {
        self.scorer.is_some()
    }

    pub async fn run(
        &self,
        session: &Session,
        upload: AnalysisUpload,
    ) -> Result<AnalysisOutcome, AppError> {
        if upload.file.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        // Step 1: Pages
        info!("Converting {} to page images", upload.file_name);
        let images = self.converter.to_images(&upload.file).await?;

        // Step 2: Text
        let resume_text = self.converter.extract_text(&upload.file).await?;
        if resume_text.trim().is_empty() {
            return Err(AppError::Conversion(format!(
                "No text could be extracted from {}",
                upload.file_name
            )));
        }
        info!(
            "Extracted {} chars from {} pages of {}",
            resume_text.len(),
            images.len(),
            upload.file_name
        );

        // Step 3: AI scoring
        let scorer = self.scorer.as_ref().ok_or(AppError::AiUnavailable)?;
        let scored_pages = &images[..images.len().min(MAX_SCORED_PAGES)];
        let raw = scorer
            .score(&resume_text, &upload.job_description, scored_pages)
            .await?;
        let result = parse_ai_output(&raw).map_err(|e| {
            warn!(
                "Unparsable AI response: {:?}",
                raw.chars().take(500).collect::<String>()
            );
            AppError::Llm(format!("AI analysis failed: {e}. Please try again."))
        })?;

        // Step 4: Record
        let mut record = AnalysisRecord::new(&upload.file_name, &upload.job_description, result);

        // Step 5: Remote assets (best-effort, owner's folder only)
        if let Some(user) = &session.user {
            record.assets = self
                .assets
                .save_assets(&user.id, &upload.file_name, &images, &record, &upload.file)
                .await;
        }
        if record.assets.is_none() {
            info!("Analysis {} kept in local cache only", record.id);
        }

        // Step 6: Local cache (always)
        let cached = self.cache.add(record.clone()).await?;
        info!(
            "Stored analysis {} ({} cached analyses)",
            record.id,
            cached.len()
        );

        Ok(AnalysisOutcome {
            record,
            page_count: images.len(),
        })
    }
}

/// Admits one pipeline run at a time. A second upload while one is in flight
/// is turned away instead of racing the first.
#[derive(Debug, Default)]
pub struct AnalysisGate {
    busy: AtomicBool,
}

impl AnalysisGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(self: &Arc<Self>) -> Option<GatePermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GatePermit {
                gate: Arc::clone(self),
            })
    }
}

/// Releases the gate on drop, including when the handler future is cancelled.
#[derive(Debug)]
pub struct GatePermit {
    gate: Arc<AnalysisGate>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}
