use std::time::Duration;

use motorwatch_core::config::{env_list, env_opt, env_or, ConfigError};
use motorwatch_core::window::DEFAULT_WINDOW_SIZE;

use crate::storage::DEFAULT_STORAGE_TIMEOUT;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8002`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Base URL of the history service. `None` keeps results in memory.
    pub history_url: Option<String>,
    /// Timeout for each call to the history service.
    pub storage_timeout: Duration,
    /// Readings kept per `(machine_id, actuator_id)` window.
    pub window_size: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `8002`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:8501` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `HISTORY_URL`          | unset (in-memory)       |
    /// | `STORAGE_TIMEOUT_SECS` | `5`                     |
    /// | `WINDOW_SIZE`          | `8`                     |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("HOST", "0.0.0.0".to_string())?;
        let port = env_or("PORT", 8002u16)?;
        let cors_origins = env_list("CORS_ORIGINS", "http://localhost:8501");
        let request_timeout_secs = env_or("REQUEST_TIMEOUT_SECS", 30u64)?;
        let history_url = env_opt("HISTORY_URL");

        let storage_timeout_secs =
            env_or("STORAGE_TIMEOUT_SECS", DEFAULT_STORAGE_TIMEOUT.as_secs_f64())?;
        let storage_timeout = positive_duration("STORAGE_TIMEOUT_SECS", storage_timeout_secs)?;

        let window_size = env_or("WINDOW_SIZE", DEFAULT_WINDOW_SIZE)?;
        if window_size == 0 {
            return Err(ConfigError::invalid(
                "WINDOW_SIZE",
                "0",
                "must be at least 1",
            ));
        }

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            history_url,
            storage_timeout,
            window_size,
        })
    }
}

fn positive_duration(var: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::invalid(var, secs.to_string(), "must be a positive number of seconds"));
    }
    Ok(Duration::from_secs_f64(secs))
}
