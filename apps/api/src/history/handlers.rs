use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::history::reconcile::{
    delete_analysis, find_analysis, load_display, DeleteOutcome, DisplaySource,
};
use crate::models::analysis::{AnalysisRecord, AnalysisSummary, AtsReport};
use crate::session::Session;
use crate::state::AppState;

pub const EMPTY_HISTORY_MESSAGE: &str = "No analyses yet. Upload a resume to get started.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub source: DisplaySource,
    pub analyses: Vec<AnalysisSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub analysis: AnalysisRecord,
    pub report: AtsReport,
}

/// GET /api/v1/analyses
pub async fn handle_list(State(state): State<AppState>, session: Session) -> Json<ListingResponse> {
    let listing = load_display(&session, &state.cache, &state.assets).await;
    let analyses: Vec<AnalysisSummary> = listing.analyses.iter().map(AnalysisRecord::summary).collect();
    Json(ListingResponse {
        source: listing.source,
        message: analyses.is_empty().then_some(EMPTY_HISTORY_MESSAGE),
        analyses,
    })
}

/// GET /api/v1/analyses/:id
pub async fn handle_detail(
    State(state): State<AppState>,
    session: Session,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DetailResponse>, AppError> {
    let id = analysis_id(id)?;
    let analysis = find_analysis(&session, &state.cache, &state.assets, id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Analysis {id} not found")))?;
    Ok(Json(DetailResponse {
        report: analysis.report(),
        analysis,
    }))
}

/// DELETE /api/v1/analyses/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    session: Session,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DeleteOutcome>, AppError> {
    let id = analysis_id(id)?;
    let outcome = delete_analysis(&session, &state.cache, &state.assets, id).await?;
    Ok(Json(outcome))
}

/// DELETE /api/v1/analyses
pub async fn handle_wipe(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.cache.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}

fn analysis_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id)
        .map_err(|e| AppError::Validation(format!("Invalid analysis id: {}", e.body_text())))
}
