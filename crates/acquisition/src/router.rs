//! Shared application router builder.
//!
//! Provides [`build_app_router`] so both the production binary (`main.rs`)
//! and integration tests (`tests/common/mod.rs`) use the same middleware
//! stack.

use std::time::Duration;

use axum::Router;

use motorwatch_core::config::ConfigError;
use motorwatch_http::with_service_layers;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

/// Build the full application [`Router`] wrapped in the service middleware.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Result<Router, ConfigError> {
    let routes = Router::new()
        // Health check at root level (not under /api/v1).
        .merge(routes::health::router())
        // Replay control under /api/v1/control.
        .nest("/api/v1", routes::api_routes())
        .with_state(state);

    with_service_layers(
        routes,
        &config.cors_origins,
        Duration::from_secs(config.request_timeout_secs),
    )
}
