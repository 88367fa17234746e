use crate::core::readiness::is_ready;
use crate::domain::model::{ClassificationRequest, DocumentContext, ManualEntry};
use crate::utils::error::{AnalyzerError, Result};

/// Keystroke filter: keeps only ASCII digits and dots.
pub fn filter_code_input(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Filters `raw` and rejects the submission when nothing usable remains.
pub fn validate_code_input(raw: &str) -> Result<String> {
    let code = filter_code_input(raw);
    if code.is_empty() {
        return Err(AnalyzerError::InvalidCode {
            raw: raw.to_string(),
        });
    }
    Ok(code)
}

/// Packages the full reference material with a validated code.
///
/// Both sources travel together; manual entries are never dropped in favour of the document.
pub fn compose_request(
    document: Option<&DocumentContext>,
    manual_entries: &[ManualEntry],
    raw_code: &str,
) -> Result<ClassificationRequest> {
    if !is_ready(document, manual_entries) {
        return Err(AnalyzerError::NotReady);
    }
    let code = validate_code_input(raw_code)?;

    tracing::debug!(
        "Composed classification request for {} (document: {}, manual entries: {})",
        code,
        document.is_some(),
        manual_entries.len()
    );

    Ok(ClassificationRequest {
        document: document.cloned(),
        manual_entries: manual_entries.to_vec(),
        code,
    })
}
