use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::USER_AGENT, HeaderMap},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::feedback::{artifact_path, FeedbackSubmission};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// POST /api/v1/feedback
///
/// Always succeeds once validated; `saved` reports whether the write landed.
pub async fn handle_feedback(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<FeedbackSubmission>, JsonRejection>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let Json(submission) =
        payload.map_err(|e| AppError::Validation(format!("Invalid feedback: {}", e.body_text())))?;
    submission.validate()?;

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let timestamp = Utc::now();
    let artifact = submission.into_artifact(user_agent, timestamp);
    let document = serde_json::to_value(&artifact).map_err(anyhow::Error::from)?;

    let path = state
        .assets
        .write_document(&artifact_path(timestamp, Uuid::new_v4()), &document)
        .await;
    info!(
        "Received {:?} feedback (rating {}), saved: {}",
        artifact.kind,
        artifact.rating,
        path.is_some()
    );
    Ok(Json(FeedbackResponse {
        saved: path.is_some(),
        path,
    }))
}
