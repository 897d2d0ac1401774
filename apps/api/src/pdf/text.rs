use bytes::Bytes;

use crate::errors::AppError;

/// Extracts plain text from a PDF. Parsing is CPU-bound, so it runs on the
/// blocking pool; a parser panic counts as a conversion failure.
pub async fn extract_text(pdf: Bytes) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf))
        .await
        .map_err(|e| AppError::Conversion(format!("Text extraction aborted: {e}")))?
        .map_err(|e| AppError::Conversion(format!("Text extraction failed: {e}")))?;
    Ok(normalize_text(&text))
}

/// Trims trailing whitespace per line and collapses runs of blank lines.
fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0;
    for line in raw.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_blank_runs() {
        let raw = "  Jane Doe   \n\n\n\nSenior Engineer\t\n\n";
        assert_eq!(normalize_text(raw), "Jane Doe\n\nSenior Engineer");
    }

    #[test]
    fn test_normalize_whitespace_only_is_empty() {
        assert_eq!(normalize_text(" \n \n\t"), "");
    }

    #[tokio::test]
    async fn test_garbage_bytes_are_conversion_error() {
        let err = extract_text(Bytes::from_static(b"not a pdf at all"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conversion(_)));
    }
}
