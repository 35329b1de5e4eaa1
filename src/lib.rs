//! Analytica Sales Analytics Orchestrator
//!
//! Answers natural-language sales/product questions by:
//! - Rejecting questions about future years before any external call
//! - Retrieving free-text context from a hosted Gemini model
//! - Asking the model for a schema-validated analysis (summary, insight,
//!   chart recommendation, data table, sources)
//! - Returning a single `{data}` / `{error}` result to the front end
//!
//! PIPELINE:
//! QUERY → GUARD → FETCH CONTEXT → ANALYZE → RESULT

pub mod api;
pub mod chart;
pub mod config;
pub mod error;
pub mod export;
pub mod flows;
pub mod gemini;
pub mod guard;
pub mod history;
pub mod models;
pub mod orchestrator;
pub mod schema;

pub use error::{AnalyticsError, Result};

// Re-export common types
pub use models::*;
pub use orchestrator::{Orchestrator, PipelineStage};
