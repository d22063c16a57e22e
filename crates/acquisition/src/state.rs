use std::sync::Arc;

use crate::config::ServerConfig;
use crate::controller::ReplayController;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub controller: Arc<ReplayController>,
}
