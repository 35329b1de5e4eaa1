//! Context retrieval flow
//!
//! Asks the model to act as a real-time retrieval agent and return detailed
//! free text with its sources, shaped as `{"context": string}`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::AnalyticsError;
use crate::flows::ContextRetriever;
use crate::gemini::GenerativeModel;
use crate::models::RetrievedContext;
use crate::schema;
use crate::Result;

const SYSTEM_PROMPT: &str = r#"You are a real-time data retrieval expert.
Respond with a single JSON object of the form {"context": "<text>"} and nothing else."#;

pub struct ContextFlow {
    model: Arc<dyn GenerativeModel>,
}

impl ContextFlow {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    fn build_prompt(query: &str) -> String {
        format!(
            r#"Your job is to use the following user query to find relevant, real-time information that can be used to generate sales data, summaries, insights and chart suggestions.

User Query: {}

Return the real-time context that you found. Be as detailed as possible. Include the sources for the context."#,
            query
        )
    }
}

#[async_trait]
impl ContextRetriever for ContextFlow {
    async fn fetch_context(&self, query: &str) -> Result<RetrievedContext> {
        if query.trim().is_empty() {
            return Err(AnalyticsError::ContextFetchFailed(
                "query is empty".to_string(),
            ));
        }

        let prompt = Self::build_prompt(query);
        let raw = self.model.generate_json(SYSTEM_PROMPT, &prompt).await?;
        debug!(bytes = raw.len(), "Context payload received");

        let context = schema::parse_context(&raw)?;
        info!(chars = context.text.len(), "Context retrieved");

        Ok(context)
    }
}
