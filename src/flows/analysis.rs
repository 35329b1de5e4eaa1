//! Data formatting & analysis flow
//!
//! Given the retrieved context and the original query, asks the model for a
//! sales table with a summary, an insight and chart recommendations. The
//! distinct-rows and sourcing rules are stated in the prompt; only the
//! structural ones are checked afterwards by `schema::parse_analysis`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::flows::Analyzer;
use crate::gemini::GenerativeModel;
use crate::models::AnalysisResult;
use crate::schema;
use crate::Result;

const SYSTEM_PROMPT: &str = r#"You are a sales data analyst.
Return ONLY a valid JSON object with exactly these keys:

{
  "summary": "<string>",
  "insight": "<string>",
  "chart_type": "bar" | "line" | "pie" | "area",
  "suggested_visuals": ["bar" | "line" | "pie" | "area", ...],
  "follow_ups": ["<string>", ...],
  "data_table": {
    "columns": ["<string>", ...],
    "rows": [["<string or number>", ...], ...]
  },
  "sources": ["<string>", ...],
  "estimated": <bool, optional>,
  "confidence": <number 0-100, optional>,
  "note": "<string, optional>"
}

Rules:
- Every row has exactly one cell per column
- Column names are unique
- chart_type must appear in suggested_visuals
- No explanation text"#;

pub struct AnalysisFlow {
    model: Arc<dyn GenerativeModel>,
}

impl AnalysisFlow {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    fn build_prompt(query: &str, context: &str) -> String {
        format!(
            r#"Given the following context and user query, generate a real-world sales table with a summary and chart recommendation.

Context: {}

Query: {}

Do not repeat identical data rows, show distinct figures, and back results with real sources. If the figures are not backed by a real source, set "estimated" to true and include a "confidence" score and a "note" explaining the estimate."#,
            context, query
        )
    }
}

#[async_trait]
impl Analyzer for AnalysisFlow {
    async fn analyze(&self, query: &str, context: &str) -> Result<AnalysisResult> {
        let prompt = Self::build_prompt(query, context);
        let raw = self.model.generate_json(SYSTEM_PROMPT, &prompt).await?;
        debug!(bytes = raw.len(), "Analysis payload received");

        let result = schema::parse_analysis(&raw).map_err(|e| {
            warn!(error = %e, "Analysis payload rejected");
            e
        })?;

        info!(
            chart_type = %result.chart_type,
            rows = result.table.rows.len(),
            estimated = result.is_estimated(),
            "Analysis complete"
        );

        Ok(result)
    }
}
