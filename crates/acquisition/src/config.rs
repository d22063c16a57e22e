use std::time::Duration;

use motorwatch_core::config::{env_list, env_or, ConfigError};
use motorwatch_core::replay::{
    IntervalLimits, DEFAULT_INTERVAL_SECS, DEFAULT_MAX_INTERVAL_SECS, DEFAULT_MIN_INTERVAL_SECS,
};

use crate::sender::DEFAULT_INGEST_TIMEOUT;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8001`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Base URL of the analysis service.
    pub analysis_url: String,
    /// CSV file replayed in a loop.
    pub source_path: String,
    /// Initial seconds between emissions.
    pub interval_secs: f64,
    pub interval_limits: IntervalLimits,
    /// Timeout for each delivery to the analysis service.
    pub ingest_timeout: Duration,
    /// Start replaying as soon as the server is up.
    pub autostart: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `8001`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:8501`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `ANALYSIS_URL`             | `http://localhost:8002`    |
    /// | `SOURCE_PATH`              | `/datos/actuator_data.csv` |
    /// | `REPLAY_INTERVAL_SECS`     | `3`                        |
    /// | `REPLAY_MIN_INTERVAL_SECS` | `0.2`                      |
    /// | `REPLAY_MAX_INTERVAL_SECS` | `30`                       |
    /// | `INGEST_TIMEOUT_SECS`      | `5`                        |
    /// | `REPLAY_AUTOSTART`         | `false`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("HOST", "0.0.0.0".to_string())?;
        let port = env_or("PORT", 8001u16)?;
        let cors_origins = env_list("CORS_ORIGINS", "http://localhost:8501");
        let request_timeout_secs = env_or("REQUEST_TIMEOUT_SECS", 30u64)?;
        let analysis_url = env_or("ANALYSIS_URL", "http://localhost:8002".to_string())?;
        let source_path = env_or("SOURCE_PATH", "/datos/actuator_data.csv".to_string())?;

        let interval_secs = env_or("REPLAY_INTERVAL_SECS", DEFAULT_INTERVAL_SECS)?;
        let min_secs = env_or("REPLAY_MIN_INTERVAL_SECS", DEFAULT_MIN_INTERVAL_SECS)?;
        let max_secs = env_or("REPLAY_MAX_INTERVAL_SECS", DEFAULT_MAX_INTERVAL_SECS)?;
        let interval_limits = IntervalLimits::new(min_secs, max_secs).map_err(|e| {
            ConfigError::invalid("REPLAY_MIN_INTERVAL_SECS", format!("{min_secs}..{max_secs}"), e)
        })?;
        if !interval_secs.is_finite() {
            return Err(ConfigError::invalid(
                "REPLAY_INTERVAL_SECS",
                interval_secs.to_string(),
                "must be a finite number of seconds",
            ));
        }

        let ingest_timeout_secs = env_or("INGEST_TIMEOUT_SECS", DEFAULT_INGEST_TIMEOUT.as_secs_f64())?;
        if !ingest_timeout_secs.is_finite() || ingest_timeout_secs <= 0.0 {
            return Err(ConfigError::invalid(
                "INGEST_TIMEOUT_SECS",
                ingest_timeout_secs.to_string(),
                "must be a positive number of seconds",
            ));
        }

        let autostart = env_or("REPLAY_AUTOSTART", false)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            analysis_url,
            source_path,
            interval_secs,
            interval_limits,
            ingest_timeout: Duration::from_secs_f64(ingest_timeout_secs),
            autostart,
        })
    }
}
