//! Main orchestrator - sequences the analytics pipeline
//!
//! IDLE → VALIDATING → FETCHING_CONTEXT → ANALYZING → SUCCEEDED
//! Any step after IDLE may end in FAILED; failures are terminal.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{AppConfig, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::error::AnalyticsError;
use crate::flows::{
    AnalysisFlow, Analyzer, ContextFlow, ContextRetriever, MockAnalyzer, MockContextRetriever,
};
use crate::gemini::{GeminiClient, GenerativeModel};
use crate::guard::{FutureDateGuard, GuardOutcome};
use crate::models::{ActionResponse, AnalysisResult};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Validating,
    FetchingContext,
    Analyzing,
    Succeeded,
    Failed,
}

/// Outcome of one invocation plus the stages it passed through
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub request_id: Uuid,
    pub response: ActionResponse,
    pub stages: Vec<PipelineStage>,
    pub elapsed_ms: u64,
}

/// Coordinates guard, context retrieval and analysis for a single query.
///
/// Holds no mutable state; one instance can serve concurrent requests.
pub struct Orchestrator {
    guard: FutureDateGuard,
    retriever: Box<dyn ContextRetriever>,
    analyzer: Box<dyn Analyzer>,
    stage_timeout: Duration,
    fixed_year: Option<i32>,
}

impl Orchestrator {
    pub fn new(retriever: Box<dyn ContextRetriever>, analyzer: Box<dyn Analyzer>) -> Self {
        Self {
            guard: FutureDateGuard::new(),
            retriever,
            analyzer,
            stage_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            fixed_year: None,
        }
    }

    /// Gemini-backed flows when an API key is configured, offline mocks otherwise
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let orchestrator = if config.has_api_key() {
            let model: Arc<dyn GenerativeModel> = Arc::new(GeminiClient::from_config(config)?);
            info!(model = %config.gemini_model, "Using Gemini flows");
            Self::new(
                Box::new(ContextFlow::new(model.clone())),
                Box::new(AnalysisFlow::new(model)),
            )
        } else {
            warn!("GEMINI_API_KEY not set; using offline demo flows");
            Self::new(Box::new(MockContextRetriever), Box::new(MockAnalyzer))
        };

        Ok(orchestrator.with_stage_timeout(config.request_timeout))
    }

    /// Deadline applied to each external call
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Pin the guard's notion of "current year"
    pub fn with_fixed_year(mut self, year: i32) -> Self {
        self.fixed_year = Some(year);
        self
    }

    /// Entry point for front ends: `{data}` or `{error}`
    pub async fn get_sales_analytics(&self, query: &str) -> ActionResponse {
        self.execute(query).await.response
    }

    pub async fn execute(&self, query: &str) -> PipelineRun {
        let request_id = Uuid::new_v4();
        let span = info_span!("analytics", %request_id);

        async move {
            let start = Instant::now();
            let mut stages = vec![PipelineStage::Idle];

            let response = match self.run_pipeline(query, &mut stages).await {
                Ok(result) => {
                    stages.push(PipelineStage::Succeeded);
                    info!(
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Analytics request succeeded"
                    );
                    ActionResponse::Data(result)
                }
                Err(e) => {
                    stages.push(PipelineStage::Failed);
                    error!(kind = e.kind(), error = %e, "Analytics request failed");
                    ActionResponse::Error(e.user_message())
                }
            };

            PipelineRun {
                request_id,
                response,
                stages,
                elapsed_ms: start.elapsed().as_millis() as u64,
            }
        }
        .instrument(span)
        .await
    }

    async fn run_pipeline(
        &self,
        query: &str,
        stages: &mut Vec<PipelineStage>,
    ) -> Result<AnalysisResult> {
        // === VALIDATE ===
        if query.trim().is_empty() {
            return Err(AnalyticsError::EmptyQuery);
        }

        enter(stages, PipelineStage::Validating);
        let outcome = match self.fixed_year {
            Some(year) => self.guard.validate_at(query, year),
            None => self.guard.validate(query),
        };
        if let GuardOutcome::Rejected { current_year, .. } = outcome {
            return Err(AnalyticsError::FutureDateRejected { current_year });
        }

        // === FETCH CONTEXT ===
        enter(stages, PipelineStage::FetchingContext);
        let context = self
            .with_deadline(self.retriever.fetch_context(query))
            .await
            .map_err(|e| {
                AnalyticsError::ContextFetchFailed(format!(
                    "Failed to fetch real-time context: {}",
                    e
                ))
            })?;

        if context.is_blank() {
            return Err(AnalyticsError::ContextFetchFailed(
                "Failed to fetch real-time context.".to_string(),
            ));
        }

        // === ANALYZE ===
        enter(stages, PipelineStage::Analyzing);
        let mut result = self
            .with_deadline(self.analyzer.analyze(query, &context.text))
            .await
            .map_err(|e| {
                AnalyticsError::AnalysisFailed(format!("Failed to get analysis from AI: {}", e))
            })?;

        result.reconcile_visuals();
        Ok(result)
    }

    async fn with_deadline<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.stage_timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AnalyticsError::Timeout(self.stage_timeout)),
        }
    }
}

fn enter(stages: &mut Vec<PipelineStage>, stage: PipelineStage) {
    debug!(stage = %stage, "Pipeline stage");
    stages.push(stage);
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Validating => "validating",
            PipelineStage::FetchingContext => "fetching_context",
            PipelineStage::Analyzing => "analyzing",
            PipelineStage::Succeeded => "succeeded",
            PipelineStage::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}
