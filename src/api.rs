//! REST API Server for the analytics pipeline
//!
//! Exposes the orchestrator, query history and table/chart helpers over
//! HTTP for the browser UI.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::chart::{build_chart_spec, ChartSpec};
use crate::export::{table_to_csv, CSV_FILE_NAME};
use crate::history::QueryHistory;
use crate::models::{
    refine_with_timeframe, ActionResponse, AnalysisResult, DataTable, EXAMPLE_QUERIES,
    TIMEFRAME_OPTIONS,
};
use crate::orchestrator::Orchestrator;

/// =============================
/// Request / Response Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalyticsRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefineRequest {
    pub query: String,
    pub timeframe: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub examples: Vec<String>,
    pub timeframes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub history: Arc<QueryHistory>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Analytics Endpoints
/// =============================

/// Records the query, then runs the pipeline. `{data}` and `{error}` are
/// both returned with 200.
async fn run_analytics(
    State(state): State<ApiState>,
    Json(req): Json<AnalyticsRequest>,
) -> Json<ActionResponse> {
    info!("Received analytics request: {}", req.query);

    if let Err(e) = state.history.add(&req.query).await {
        warn!(error = %e, "Failed to persist query history");
    }

    Json(state.orchestrator.get_sales_analytics(&req.query).await)
}

async fn refine_analytics(
    State(state): State<ApiState>,
    Json(req): Json<RefineRequest>,
) -> Response {
    if !TIMEFRAME_OPTIONS.contains(&req.timeframe.as_str()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: format!("Unsupported timeframe: {}", req.timeframe),
            }),
        )
            .into_response();
    }

    let query = refine_with_timeframe(&req.query, &req.timeframe);
    run_analytics(State(state), Json(AnalyticsRequest { query }))
        .await
        .into_response()
}

/// =============================
/// History Endpoints
/// =============================

async fn get_history(State(state): State<ApiState>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        history: state.history.entries().await,
    })
}

async fn clear_history(State(state): State<ApiState>) -> StatusCode {
    match state.history.clear().await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            warn!(error = %e, "Failed to clear stored history");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// =============================
/// Presentation Helpers
/// =============================

async fn export_csv(Json(table): Json<DataTable>) -> Response {
    match table_to_csv(&table) {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", CSV_FILE_NAME),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn chart_spec(Json(result): Json<AnalysisResult>) -> Result<Json<ChartSpec>, (StatusCode, Json<ErrorBody>)> {
    build_chart_spec(&result).map(Json).ok_or_else(|| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorBody {
                error: "Not enough data to display a chart.".to_string(),
            }),
        )
    })
}

async fn suggestions() -> Json<SuggestionsResponse> {
    Json(SuggestionsResponse {
        examples: EXAMPLE_QUERIES.iter().map(|q| q.to_string()).collect(),
        timeframes: TIMEFRAME_OPTIONS.iter().map(|t| t.to_string()).collect(),
    })
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<Orchestrator>, history: Arc<QueryHistory>) -> Router {
    let state = ApiState {
        orchestrator,
        history,
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/analytics", post(run_analytics))
        .route("/api/analytics/refine", post(refine_analytics))
        .route("/api/history", get(get_history).delete(clear_history))
        .route("/api/export/csv", post(export_csv))
        .route("/api/chart", post(chart_spec))
        .route("/api/suggestions", get(suggestions))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    orchestrator: Arc<Orchestrator>,
    history: Arc<QueryHistory>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(orchestrator, history);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::{MockAnalyzer, MockContextRetriever};
    use crate::history::InMemoryKeyValueStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn test_router() -> (Router, Arc<QueryHistory>) {
        let orchestrator = Arc::new(
            Orchestrator::new(Box::new(MockContextRetriever), Box::new(MockAnalyzer))
                .with_fixed_year(2025),
        );
        let history = Arc::new(QueryHistory::load(Arc::new(InMemoryKeyValueStore::new())).await);
        (create_router(orchestrator, history.clone()), history)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _) = test_router().await;
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_analytics_success_records_history() {
        let (router, history) = test_router().await;

        let response = router
            .oneshot(post_json(
                "/api/analytics",
                serde_json::json!({ "query": "iPhone sales in India 2023" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["data"]["summary"].is_string());
        assert_eq!(history.entries().await, vec!["iPhone sales in India 2023".to_string()]);
    }

    #[tokio::test]
    async fn test_analytics_error_is_payload() {
        let (router, history) = test_router().await;

        let response = router
            .oneshot(post_json("/api/analytics", serde_json::json!({ "query": "EV sales in 2030" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(
            json["error"],
            "I cannot predict the future. Please ask for a year up to 2025."
        );
        // Recorded before the result is known
        assert_eq!(history.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_refine_rejects_unknown_timeframe() {
        let (router, _) = test_router().await;
        let response = router
            .oneshot(post_json(
                "/api/analytics/refine",
                serde_json::json!({ "query": "iPhone sales", "timeframe": "7 weeks" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_refine_appends_timeframe() {
        let (router, history) = test_router().await;
        let response = router
            .oneshot(post_json(
                "/api/analytics/refine",
                serde_json::json!({ "query": "iPhone sales", "timeframe": "6 months" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            history.entries().await,
            vec!["iPhone sales for the last 6 months".to_string()]
        );
    }

    #[tokio::test]
    async fn test_history_clear() {
        let (router, history) = test_router().await;
        history.add("A").await.unwrap();

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/api/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["history"], serde_json::json!(["A"]));

        let response = router
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/history")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(history.entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_export_csv() {
        let (router, _) = test_router().await;
        let response = router
            .oneshot(post_json(
                "/api/export/csv",
                serde_json::json!({ "columns": ["Brand", "Units"], "rows": [["Apple", 10]] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains(CSV_FILE_NAME));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Brand,Units\nApple,10\n");
    }

    #[tokio::test]
    async fn test_chart_spec_not_enough_data() {
        let (router, _) = test_router().await;
        let body = serde_json::json!({
            "summary": "", "insight": "", "chart_type": "bar",
            "suggested_visuals": ["bar"], "follow_ups": [],
            "data_table": { "columns": ["Units"], "rows": [[1]] },
            "sources": []
        });
        let response = router.oneshot(post_json("/api/chart", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
