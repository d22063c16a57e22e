use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use motorwatch_acquisition::config::ServerConfig;
use motorwatch_acquisition::controller::ReplayController;
use motorwatch_acquisition::router::build_app_router;
use motorwatch_acquisition::sender::HttpIngestClient;
use motorwatch_acquisition::source::CsvFileSource;
use motorwatch_acquisition::state::AppState;
use motorwatch_http::shutdown_signal;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "motorwatch_acquisition=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Acquisition service failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        source = %config.source_path,
        analysis_url = %config.analysis_url,
        interval_secs = config.interval_secs,
        "Loaded server configuration"
    );

    // --- Replay controller ---
    let sink = HttpIngestClient::new(&config.analysis_url, config.ingest_timeout)?;
    let controller = Arc::new(ReplayController::new(
        Arc::new(CsvFileSource::new(&config.source_path)),
        Arc::new(sink),
        config.interval_limits,
        config.interval_secs,
    )?);

    if config.autostart {
        match controller.start().await {
            Ok(outcome) => tracing::info!(message = %outcome.message, "Replay autostarted"),
            Err(e) => tracing::error!(error = %e, "Replay autostart failed, waiting for /control/start"),
        }
    }

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        controller: Arc::clone(&controller),
    };

    let app = build_app_router(state, &config)?;

    // --- Start server ---
    let addr = SocketAddr::new(config.host.parse()?, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, stopping replay");
    controller.stop().await;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}
