use serde_json::Value;
use thiserror::Error;

use crate::llm_client::strip_json_fences;

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("AI response was empty")]
    Empty,

    #[error("AI response was not valid JSON")]
    NotJson,
}

/// Pulls the single JSON object out of raw model output.
///
/// Tries, in order: the whole text, the text with code fences stripped, and the
/// span from the first `{` to the last `}`. Only a JSON object is accepted; no
/// field-level schema is enforced here.
pub fn parse_ai_output(text: &str) -> Result<Value, ExtractError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }

    if let Some(obj) = parse_object(text) {
        return Ok(obj);
    }
    if let Some(obj) = parse_object(strip_json_fences(text)) {
        return Ok(obj);
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => {
            parse_object(&text[start..=end]).ok_or(ExtractError::NotJson)
        }
        _ => Err(ExtractError::NotJson),
    }
}

fn parse_object(candidate: &str) -> Option<Value> {
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(Value::is_object)
}
