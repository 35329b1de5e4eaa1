//! Gemini API client
//!
//! The call boundary for both flows: one prompt in, the raw JSON text of the
//! first candidate out. Shape validation happens in `crate::schema`.
//! Uses a long-lived reqwest::Client for connection pooling.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::error::AnalyticsError;
use crate::Result;

/// A hosted generative model that answers with JSON text
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate_json(&self, system_prompt: &str, prompt: &str) -> Result<String>;
}

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!(
                "{}/{}:generateContent",
                base_url.trim_end_matches('/'),
                model
            ),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config.gemini_api_key.clone().ok_or_else(|| {
            AnalyticsError::ConfigError("GEMINI_API_KEY not configured".to_string())
        })?;

        Self::new(
            api_key,
            &config.gemini_base_url,
            &config.gemini_model,
            config.request_timeout,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_json(&self, system_prompt: &str, prompt: &str) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(AnalyticsError::LlmError(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 4096,
                response_mime_type: "application/json".to_string(),
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: system_prompt.to_string(),
                }],
            },
        };

        debug!(endpoint = %self.endpoint, "Calling Gemini API");

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                if e.is_timeout() {
                    AnalyticsError::LlmError("Gemini API request timed out".to_string())
                } else {
                    AnalyticsError::LlmError(format!("Gemini API error: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(AnalyticsError::LlmError(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            AnalyticsError::LlmError(format!("Gemini parse error: {}", e))
        })?;

        let candidate = gemini_response.candidates.first().ok_or_else(|| {
            AnalyticsError::LlmError("No response from Gemini API".to_string())
        })?;

        let text: String = candidate
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();

        if text.trim().is_empty() {
            return Err(AnalyticsError::LlmError(format!(
                "Empty response from Gemini (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        if let Some(usage) = &gemini_response.usage_metadata {
            info!(
                prompt_tokens = usage.prompt_token_count,
                candidate_tokens = usage.candidates_token_count,
                "Gemini response received"
            );
        } else {
            info!("Gemini response received");
        }

        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
    response_mime_type: String,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Content,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: i32,
    #[serde(default)]
    candidates_token_count: i32,
}
