//! Circuit layout download client.

use async_trait::async_trait;
use tracing::debug;

use crate::error::FetchError;
use crate::source::CircuitLayoutSource;

use super::geojson::FeatureCollection;

/// Default location of the circuit layout dataset.
const DEFAULT_URL: &str =
    "https://raw.githubusercontent.com/bacinger/f1-circuits/refs/heads/master/f1-circuits.geojson";

/// Configuration for the layout client.
#[derive(Debug, Clone)]
pub struct CircuitLayoutConfig {
    /// Dataset URL
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl CircuitLayoutConfig {
    /// Set a custom URL (for testing).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for CircuitLayoutConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Client for the static circuit layout dataset.
#[derive(Debug, Clone)]
pub struct CircuitLayoutClient {
    http: reqwest::Client,
    url: String,
}

impl CircuitLayoutClient {
    /// Create a new layout client.
    pub fn new(config: CircuitLayoutConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: config.url,
        })
    }

    /// Download and parse the whole dataset.
    pub async fn fetch_all(&self) -> Result<FeatureCollection, FetchError> {
        debug!(url = %self.url, "downloading circuit layouts");
        let response = self.http.get(&self.url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| FetchError::json(&e, &body))
    }
}

#[async_trait]
impl CircuitLayoutSource for CircuitLayoutClient {
    async fn circuit_layouts(&self) -> Result<FeatureCollection, FetchError> {
        self.fetch_all().await
    }
}
