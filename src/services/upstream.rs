//! Upstream content API client
//!
//! One GET per call against `{base}/api/{type}/{id}`, bounded by the
//! configured timeout. There are no retries: a failed attempt is reported
//! straight back to the caller.

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::Config;
use crate::models::MediaRecord;
use crate::services::metrics::record_upstream;

/// Upstream fetch failures
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout or body read failure
    #[error("Network error: {0}")]
    Network(String),
    /// Non-2xx response
    #[error("HTTP {status} for url: {url}")]
    Status { status: u16, url: String },
    /// Body was not the expected JSON
    #[error("Invalid upstream JSON: {0}")]
    Decode(String),
}

impl FetchError {
    fn outcome(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::Status { .. } => "status",
            FetchError::Decode(_) => "decode",
        }
    }
}

/// Upstream API client
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: String,
}

impl UpstreamClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Upstream host (e.g., "https://api.example.com")
    /// * `timeout` - Whole-request timeout
    /// * `user_agent` - Outbound User-Agent header
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> reqwest::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        Self::new(
            &config.upstream_base_url,
            Duration::from_millis(config.fetch_timeout_ms),
            &config.user_agent,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Record URL; `kind` and `id` are embedded verbatim
    pub fn record_url(&self, kind: &str, id: &str) -> String {
        format!("{}/api/{}/{}", self.base_url, kind, id)
    }

    /// Fetch and decode a record
    pub async fn fetch_record(&self, kind: &str, id: &str) -> Result<MediaRecord, FetchError> {
        self.get(kind, id).await
    }

    /// Fetch a record without interpreting it
    pub async fn fetch_raw(&self, kind: &str, id: &str) -> Result<serde_json::Value, FetchError> {
        self.get(kind, id).await
    }

    async fn get<T: DeserializeOwned>(&self, kind: &str, id: &str) -> Result<T, FetchError> {
        let result = self.try_get(kind, id).await;
        match &result {
            Ok(_) => record_upstream("ok"),
            Err(e) => record_upstream(e.outcome()),
        }
        result
    }

    async fn try_get<T: DeserializeOwned>(&self, kind: &str, id: &str) -> Result<T, FetchError> {
        let url = self.record_url(kind, id);
        debug!("Upstream request: {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| {
            error!("Failed to decode upstream response for {}: {}", url, e);
            debug!("Response text: {}", truncate(&text, 500));
            FetchError::Decode(e.to_string())
        })
    }
}

/// Cut `text` to at most `max` bytes on a char boundary
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
