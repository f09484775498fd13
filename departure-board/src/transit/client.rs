//! HTTP client for the transit connection service.
//!
//! Queries a JSON endpoint that answers with the next connections between
//! two stations from a given point in time.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::header::{HeaderMap, HeaderValue};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::RawDeparture;

use super::error::FetchError;
use super::source::ConnectionSource;
use super::types::{ConnectionDto, convert_connections};

/// Default base URL for the connection service.
const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Configuration for the transit client.
#[derive(Debug, Clone)]
pub struct TransitConfig {
    /// API key sent as `x-apikey`, if the service needs one
    pub api_key: Option<String>,
    /// Base URL for the API
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TransitConfig {
    /// Create a new config pointing at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api_key: None,
            base_url: base_url.into(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Connection source backed by the HTTP API.
///
/// Uses a semaphore to limit concurrent requests.
#[derive(Debug, Clone)]
pub struct HttpConnectionSource {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl HttpConnectionSource {
    /// Create a new client with the given configuration.
    pub fn new(config: TransitConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();

        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).map_err(|_| FetchError::Api {
                status: 0,
                message: "Invalid API key format".to_string(),
            })?;
            headers.insert("x-apikey", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    /// The endpoint queried for connections.
    pub fn connections_url(&self) -> String {
        format!("{}/connections", self.base_url)
    }
}

/// Query parameters for one connection request.
fn query_params(
    start: &str,
    goal: &str,
    at: NaiveDateTime,
    only_direct: bool,
) -> [(&'static str, String); 5] {
    [
        ("start", start.to_string()),
        ("goal", goal.to_string()),
        ("date", at.format("%Y-%m-%d").to_string()),
        ("time", at.format("%H:%M").to_string()),
        ("onlyDirect", only_direct.to_string()),
    ]
}

#[async_trait]
impl ConnectionSource for HttpConnectionSource {
    async fn connections(
        &self,
        start: &str,
        goal: &str,
        at: NaiveDateTime,
        only_direct: bool,
    ) -> Result<Vec<RawDeparture>, FetchError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| FetchError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        debug!(start, goal, %at, only_direct, "querying connections");

        let response = self
            .http
            .get(self.connections_url())
            .query(&query_params(start, goal, at, only_direct))
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        let dtos: Vec<ConnectionDto> =
            serde_json::from_str(&body).map_err(|e| FetchError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            })?;

        convert_connections(dtos)
    }
}
