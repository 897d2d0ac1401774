use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::analysis::pipeline::AnalysisUpload;
use crate::errors::AppError;
use crate::models::analysis::{AnalysisRecord, AtsReport};
use crate::pdf::format_file_size;
use crate::session::Session;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadInfo {
    pub file_name: String,
    pub size_bytes: u64,
    pub size_label: String,
    pub page_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub analysis: AnalysisRecord,
    pub report: AtsReport,
    pub upload: UploadInfo,
    pub assets_saved: bool,
}

/// POST /api/v1/analyses
///
/// Multipart body: `file` (the resume PDF) and an optional `jobDescription`.
/// Remote assets are only saved for a signed-in session.
pub async fn handle_analyze(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let _permit = state
        .gate
        .try_acquire()
        .ok_or_else(|| AppError::Conflict("An analysis is already in progress".to_string()))?;

    let upload = read_upload(multipart).await?;
    let file_name = upload.file_name.clone();
    let size_bytes = upload.file.len() as u64;
    info!("Analyzing {file_name} ({})", format_file_size(size_bytes));

    let outcome = state.pipeline.run(&session, upload).await?;
    let report = outcome.record.report();
    Ok(Json(AnalyzeResponse {
        assets_saved: outcome.record.assets.is_some(),
        report,
        upload: UploadInfo {
            file_name,
            size_bytes,
            size_label: format_file_size(size_bytes),
            page_count: outcome.page_count,
        },
        analysis: outcome.record,
    }))
}

async fn read_upload(mut multipart: Multipart) -> Result<AnalysisUpload, AppError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut job_description = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let name = field
                    .file_name()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .unwrap_or("resume.pdf")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                file = Some((name, data));
            }
            Some("jobDescription") | Some("job_description") => {
                job_description = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid job description: {e}")))?;
            }
            _ => {}
        }
    }

    let (file_name, file) =
        file.ok_or_else(|| AppError::Validation("Missing `file` field".to_string()))?;
    Ok(AnalysisUpload {
        file_name,
        file,
        job_description: job_description.trim().to_string(),
    })
}
