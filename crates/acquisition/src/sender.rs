//! Delivery of readings to the analysis service.
//!
//! [`IngestSink`] is the seam the replay loop talks to; [`HttpIngestClient`]
//! posts each reading as JSON to `{ANALYSIS_URL}/api/v1/ingest`. Only a 2xx
//! response counts as delivered.

use std::time::Duration;

use async_trait::async_trait;

use motorwatch_core::reading::Reading;

/// Default HTTP timeout for one delivery.
pub const DEFAULT_INGEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Path of the ingestion entrypoint on the analysis service.
pub const INGEST_PATH: &str = "/api/v1/ingest";

/// Error type for delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The analysis service answered with a non-2xx status.
    #[error("Analysis service returned HTTP {0}")]
    HttpStatus(u16),
}

/// Accepts readings emitted by the replay loop.
#[async_trait]
pub trait IngestSink: Send + Sync {
    /// Deliver one reading. `Ok` means the receiver confirmed acceptance.
    async fn deliver(&self, reading: &Reading) -> Result<(), DeliveryError>;

    /// Short human-readable description for logs and health output.
    fn describe(&self) -> String;
}

/// Posts readings to the analysis service over HTTP.
pub struct HttpIngestClient {
    client: reqwest::Client,
    url: String,
}

impl HttpIngestClient {
    /// Create a client for the analysis service at `base_url`, bounded by
    /// `timeout` per request.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}{INGEST_PATH}", base_url.trim_end_matches('/')),
        }
    }

    /// Full ingestion URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl IngestSink for HttpIngestClient {
    async fn deliver(&self, reading: &Reading) -> Result<(), DeliveryError> {
        let response = self.client.post(&self.url).json(reading).send().await?;

        if !response.status().is_success() {
            return Err(DeliveryError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_url_is_built_from_base() {
        let client = HttpIngestClient::with_client(reqwest::Client::new(), "http://analysis:8002/");
        assert_eq!(client.url(), "http://analysis:8002/api/v1/ingest");
    }

    #[test]
    fn delivery_error_display_http_status() {
        assert_eq!(
            DeliveryError::HttpStatus(422).to_string(),
            "Analysis service returned HTTP 422"
        );
    }

    #[tokio::test]
    async fn unreachable_analysis_service_is_an_error() {
        let client = HttpIngestClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let reading = Reading {
            ts: "t".into(),
            entity_id: "arm_01".into(),
            channel_id: "base".into(),
            temperature_c: 40.0,
            speed_rpm: 1000.0,
            vibration_rms: 0.1,
        };
        assert!(matches!(
            client.deliver(&reading).await,
            Err(DeliveryError::Request(_))
        ));
    }
}
