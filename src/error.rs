//! Error types for the analytics pipeline

use std::time::Duration;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Prefix shared by every failure that is not an input-validation failure
pub const GENERIC_FAILURE_PREFIX: &str = "An error occurred while processing your request";

#[derive(Error, Debug)]
pub enum AnalyticsError {

    // =============================
    // Pipeline Outcomes
    // =============================

    #[error("Query cannot be empty.")]
    EmptyQuery,

    #[error("I cannot predict the future. Please ask for a year up to {current_year}.")]
    FutureDateRejected { current_year: i32 },

    #[error("{0}")]
    ContextFetchFailed(String),

    #[error("{0}")]
    AnalysisFailed(String),

    #[error("{0}")]
    Unknown(String),

    // =============================
    // Supporting Errors
    // =============================

    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("History storage error: {0}")]
    StorageError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl AnalyticsError {
    /// The string shown to the end user.
    ///
    /// Input-validation failures keep their literal message; everything else
    /// is wrapped with [`GENERIC_FAILURE_PREFIX`].
    pub fn user_message(&self) -> String {
        match self {
            AnalyticsError::EmptyQuery | AnalyticsError::FutureDateRejected { .. } => {
                self.to_string()
            }
            other => {
                let detail = other.to_string();
                let detail = if detail.trim().is_empty() {
                    "An unknown error occurred.".to_string()
                } else {
                    detail
                };
                format!("{}: {}", GENERIC_FAILURE_PREFIX, detail)
            }
        }
    }

    /// Short machine-readable tag, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyticsError::EmptyQuery => "empty_query",
            AnalyticsError::FutureDateRejected { .. } => "future_date_rejected",
            AnalyticsError::ContextFetchFailed(_) => "context_fetch_failed",
            AnalyticsError::AnalysisFailed(_) => "analysis_failed",
            AnalyticsError::SchemaViolation(_) => "schema_violation",
            AnalyticsError::LlmError(_) | AnalyticsError::HttpError(_) => "llm",
            AnalyticsError::Timeout(_) => "timeout",
            AnalyticsError::ConfigError(_) => "config",
            AnalyticsError::StorageError(_) | AnalyticsError::IoError(_) => "storage",
            AnalyticsError::SerializationError(_) | AnalyticsError::CsvError(_) => "serialization",
            AnalyticsError::Unknown(_) => "unknown",
        }
    }
}
