//! Shape validators for model payloads
//!
//! Pure functions from the raw text a model returned to a typed value.
//! Nothing here is auto-corrected: a payload that does not match is a
//! `SchemaViolation`.

use crate::error::AnalyticsError;
use crate::models::{AnalysisResult, RetrievedContext};
use crate::Result;

/// Remove a surrounding markdown code fence, if the model added one
pub fn strip_code_fence(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Validate a context-retrieval payload: `{"context": string}`
pub fn parse_context(raw: &str) -> Result<RetrievedContext> {
    let cleaned = strip_code_fence(raw);

    serde_json::from_str::<RetrievedContext>(cleaned).map_err(|e| {
        AnalyticsError::SchemaViolation(format!("context payload: {}", e))
    })
}

/// Validate an analysis payload against the `AnalysisResult` shape
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult> {
    let cleaned = strip_code_fence(raw);

    let result: AnalysisResult = serde_json::from_str(cleaned).map_err(|e| {
        AnalyticsError::SchemaViolation(format!("analysis payload: {}", e))
    })?;

    validate_analysis(&result)?;
    Ok(result)
}

/// Structural checks serde cannot express
pub fn validate_analysis(result: &AnalysisResult) -> Result<()> {
    let table = &result.table;

    if let Some(index) = table.first_ragged_row() {
        return Err(AnalyticsError::SchemaViolation(format!(
            "row {} has {} cells but the table has {} columns",
            index,
            table.rows[index].len(),
            table.columns.len()
        )));
    }

    if let Some(column) = table.duplicate_column() {
        return Err(AnalyticsError::SchemaViolation(format!(
            "duplicate column '{}'",
            column
        )));
    }

    if table.all_rows_identical() {
        return Err(AnalyticsError::SchemaViolation(
            "all data rows are identical".to_string(),
        ));
    }

    Ok(())
}
