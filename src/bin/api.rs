use analytica::{api::start_server, config::AppConfig, history::QueryHistory, Orchestrator};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    info!("🚀 Analytica - API Server");
    info!("📍 Port: {}", config.port);

    let orchestrator = Arc::new(Orchestrator::from_config(&config)?);
    let history = Arc::new(QueryHistory::from_config(&config).await?);

    info!(
        persisted = config.history_dir.is_some(),
        entries = history.entries().await.len(),
        "✅ Orchestrator and history initialized"
    );
    info!("📡 Starting API server...");

    start_server(orchestrator, history, config.port).await?;

    Ok(())
}
