//! ATS scoring behind a pluggable AI collaborator.
//!
//! `AnalysisPipeline` holds an `Option<Arc<dyn AtsScorer>>`; `None` means no AI
//! backend is configured and every analysis fails fast with `AiUnavailable`.

use async_trait::async_trait;
use tracing::info;

use crate::analysis::prompts::build_ats_prompt;
use crate::errors::AppError;
use crate::llm_client::{LlmClient, LlmError, MODEL};
use crate::pdf::PageImage;

/// Returns the model's raw text. Parsing it is the caller's job.
///
/// Implementations report failures as `AppError::Llm` with a message that
/// includes the underlying cause.
#[async_trait]
pub trait AtsScorer: Send + Sync {
    async fn score(
        &self,
        resume_text: &str,
        job_description: &str,
        images: &[PageImage],
    ) -> Result<String, AppError>;
}

pub struct LlmAtsScorer {
    llm: LlmClient,
}

impl LlmAtsScorer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl AtsScorer for LlmAtsScorer {
    async fn score(
        &self,
        resume_text: &str,
        job_description: &str,
        images: &[PageImage],
    ) -> Result<String, AppError> {
        let prompt = build_ats_prompt(resume_text, job_description);
        info!(
            "Requesting ATS score from {MODEL} ({} chars, {} images)",
            prompt.len(),
            images.len()
        );

        let response = self.llm.call(&prompt, images).await.map_err(ai_failure)?;
        response
            .text()
            .map(String::from)
            .ok_or_else(|| ai_failure(LlmError::EmptyContent))
    }
}

fn ai_failure(e: LlmError) -> AppError {
    AppError::Llm(format!("AI analysis failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_failure_message_keeps_cause() {
        let err = ai_failure(LlmError::Api {
            status: 500,
            message: "overloaded".to_string(),
        });
        assert!(matches!(&err, AppError::Llm(msg) if msg.starts_with("AI analysis failed:")));
        assert!(err.to_string().contains("overloaded"));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_empty_content_message() {
        let err = ai_failure(LlmError::EmptyContent);
        assert_eq!(err.to_string(), "AI analysis failed: LLM returned empty content");
    }
}
