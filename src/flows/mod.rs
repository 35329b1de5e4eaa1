//! Flow traits and implementations
//!
//! A flow is one prompt-template call to a generative model whose response
//! is validated against a fixed shape. The orchestrator only sees the traits.

use crate::models::{AnalysisResult, ChartType, DataTable, RetrievedContext};
use crate::Result;
use async_trait::async_trait;

pub mod analysis;
pub mod context;
pub use analysis::AnalysisFlow;
pub use context::ContextFlow;

/// Retrieves free-text context for a query (first external call)
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    async fn fetch_context(&self, query: &str) -> Result<RetrievedContext>;
}

/// Turns a query plus context into a structured result (second external call)
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, query: &str, context: &str) -> Result<AnalysisResult>;
}

/// Mock retriever for development & testing
/// Keeps the pipeline runnable without an API key
pub struct MockContextRetriever;

#[async_trait]
impl ContextRetriever for MockContextRetriever {
    async fn fetch_context(&self, query: &str) -> Result<RetrievedContext> {
        if query.trim().is_empty() {
            return Err(crate::error::AnalyticsError::ContextFetchFailed(
                "query is empty".to_string(),
            ));
        }

        Ok(RetrievedContext {
            text: format!(
                "Offline demo context for '{}'. Figures are illustrative. \
                 Source: Analytica sample dataset.",
                query.trim()
            ),
        })
    }
}

/// Mock analyzer returning a small, well-formed estimated table
pub struct MockAnalyzer;

#[async_trait]
impl Analyzer for MockAnalyzer {
    async fn analyze(&self, query: &str, _context: &str) -> Result<AnalysisResult> {
        Ok(AnalysisResult {
            summary: format!("Illustrative quarterly sales figures for: {}", query.trim()),
            insight: "Sales accelerate into the fourth quarter, driven by festive-season demand."
                .to_string(),
            chart_type: ChartType::Bar,
            suggested_visuals: vec![ChartType::Bar, ChartType::Line, ChartType::Area],
            follow_ups: vec![
                "How does this compare with the previous year?".to_string(),
                "Which regions contributed most to growth?".to_string(),
            ],
            table: DataTable {
                columns: vec!["Quarter".to_string(), "Units (M)".to_string()],
                rows: vec![
                    vec!["Q1".into(), 2.into()],
                    vec!["Q2".into(), 3.into()],
                    vec!["Q3".into(), 4.into()],
                    vec!["Q4".into(), 6.into()],
                ],
            },
            sources: vec!["Analytica sample dataset".to_string()],
            estimated: Some(true),
            confidence: Some(50.0),
            note: Some("Offline demo data; not sourced from a live model.".to_string()),
        })
    }
}
