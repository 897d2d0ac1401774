//! User feedback, stored as standalone JSON documents next to the analyses.

pub mod handlers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

pub const FEEDBACK_DIR: &str = "feedback";
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    #[default]
    General,
    Bug,
    Feature,
    Improvement,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackSubmission {
    #[serde(rename = "type", default)]
    pub kind: FeedbackKind,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// The document written to the asset store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackArtifact {
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub rating: u8,
    pub message: String,
    pub email: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub user_agent: Option<String>,
}

impl FeedbackSubmission {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.message.trim().is_empty() {
            return Err(AppError::Validation(
                "Feedback message must not be empty".to_string(),
            ));
        }
        if self.rating > MAX_RATING {
            return Err(AppError::Validation(format!(
                "Rating must be between 0 and {MAX_RATING}"
            )));
        }
        Ok(())
    }

    pub fn into_artifact(self, user_agent: Option<String>, timestamp: DateTime<Utc>) -> FeedbackArtifact {
        FeedbackArtifact {
            kind: self.kind,
            rating: self.rating,
            message: self.message.trim().to_string(),
            email: self
                .email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            timestamp,
            user_agent,
        }
    }
}

/// `feedback/<epoch ms>-<8 hex of id>.json`, relative to the asset namespace.
pub fn artifact_path(timestamp: DateTime<Utc>, id: Uuid) -> String {
    let mut suffix = id.simple().to_string();
    suffix.truncate(8);
    format!("{FEEDBACK_DIR}/{}-{suffix}.json", timestamp.timestamp_millis())
}
