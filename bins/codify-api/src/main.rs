mod handlers;
mod routes;

use axum::Router;
use codify_common::store::MemoryStore;
use codify_core::executor::{CommandStrategy, ExecutionStrategy, RunnerConfig};
use codify_core::queue::QueueCoordinator;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub coordinator: Arc<QueueCoordinator>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Codify API booting...");

    // Runner configuration for the subprocess execution strategy
    let config_path =
        std::env::var("RUNNER_CONFIG").unwrap_or_else(|_| "config/runner.json".to_string());
    let runner_config = match RunnerConfig::load(Path::new(&config_path)) {
        Ok(config) => {
            info!(
                command = %config.command,
                timeout_ms = config.timeout_ms,
                "Loaded runner config from {}", config_path
            );
            config
        }
        Err(e) => {
            warn!("Failed to load {}: {}; using default runner", config_path, e);
            RunnerConfig::default()
        }
    };

    let store = Arc::new(MemoryStore::new());
    let strategy: Arc<dyn ExecutionStrategy> = Arc::new(CommandStrategy::new(runner_config));
    let coordinator = QueueCoordinator::new(
        Arc::clone(&store) as Arc<dyn codify_common::store::SubmissionStore>,
        strategy,
    );

    let state = Arc::new(AppState { store, coordinator });

    // Build router
    let app = Router::new().merge(routes::routes()).with_state(state);

    // Start server
    let addr = std::env::var("CODIFY_ADDR").unwrap_or_else(|_| "0.0.0.0:7777".to_string());
    let listener = TcpListener::bind(&addr).await?;

    info!("HTTP server listening on {}", addr);
    info!("Ready to accept submissions");

    axum::serve(listener, app).await?;
    Ok(())
}
