use analytica::{config::AppConfig, history::QueryHistory, ActionResponse, Orchestrator, EXAMPLE_QUERIES};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let query = if args.is_empty() {
        EXAMPLE_QUERIES[0].to_string()
    } else {
        args.join(" ")
    };

    info!(query = %query, "Analytica starting");

    let orchestrator = Orchestrator::from_config(&config)?;
    let history = QueryHistory::from_config(&config).await?;
    if let Err(e) = history.add(&query).await {
        tracing::warn!(error = %e, "Failed to persist query history");
    }

    let run = orchestrator.execute(&query).await;
    info!(
        request_id = %run.request_id,
        elapsed_ms = run.elapsed_ms,
        stages = ?run.stages,
        "Pipeline finished"
    );

    println!("{}", serde_json::to_string_pretty(&run.response)?);

    match run.response {
        ActionResponse::Data(_) => Ok(()),
        ActionResponse::Error(message) => Err(message.into()),
    }
}
