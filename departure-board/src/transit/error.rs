//! Transit query error types.

use std::time::Duration;

/// Errors from querying the transit service.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid API key or unauthorized
    #[error("unauthorized (invalid API key)")]
    Unauthorized,

    /// Rate limited by the API
    #[error("rate limited by transit API")]
    RateLimited,

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// JSON deserialization failed
    #[error("JSON parse error: {message}{}", body_suffix(.body))]
    Json {
        message: String,
        body: Option<String>,
    },

    /// A record carried a malformed field
    #[error("invalid connection record: {0}")]
    InvalidRecord(String),

    /// The first query window came back empty
    #[error("no connections returned")]
    NoConnections,

    /// The query did not finish in time
    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    /// The source cannot serve this route
    #[error("route unavailable: {0}")]
    Unavailable(String),
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_ref()
        .map(|b| format!(" (body: {b})"))
        .unwrap_or_default()
}
