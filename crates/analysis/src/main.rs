use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use motorwatch_analysis::classifier::WindowClassifier;
use motorwatch_analysis::config::ServerConfig;
use motorwatch_analysis::router::build_app_router;
use motorwatch_analysis::state::AppState;
use motorwatch_http::shutdown_signal;
use motorwatch_analysis::storage::{DiagnosisStore, HttpHistoryStore, MemoryStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "motorwatch_analysis=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Analysis service failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        window_size = config.window_size,
        "Loaded server configuration"
    );

    // --- Storage ---
    let store: Arc<dyn DiagnosisStore> = match &config.history_url {
        Some(url) => {
            tracing::info!(history_url = %url, "Forwarding results to history service");
            Arc::new(HttpHistoryStore::new(url.as_str(), config.storage_timeout)?)
        }
        None => {
            tracing::warn!("HISTORY_URL not set, keeping results in memory only");
            Arc::new(MemoryStore::default())
        }
    };

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        classifier: Arc::new(WindowClassifier::new(config.window_size, store)),
    };

    let app = build_app_router(state, &config)?;

    // --- Start server ---
    let addr = SocketAddr::new(config.host.parse()?, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}
