//! Error types for dm-graph

use thiserror::Error;

/// Directory service errors
#[derive(Error, Debug)]
pub enum GraphError {
    /// G001: No bearer token could be obtained
    #[error("[G001] Authentication failed: {0}")]
    Auth(String),

    /// G002: Transport failure (connect, timeout, TLS)
    #[error("[G002] Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// G003: The service answered with an OData error body
    #[error("[G003] {status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// G004: The requested resource does not exist
    #[error("[G004] Resource not found: {resource}")]
    NotFound { resource: String },

    /// G005: The response body is not what the caller expected
    #[error("[G005] Unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// G006: The client could not be constructed
    #[error("[G006] Invalid client configuration: {0}")]
    Config(String),
}

/// Result type alias for GraphError
pub type GraphResult<T> = Result<T, GraphError>;

impl GraphError {
    /// Whether the error is a 404 from the service
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound { .. })
    }

    /// Whether the service refused the call for lack of permission or licence
    pub fn is_forbidden(&self) -> bool {
        matches!(self, GraphError::Api { status: 401 | 403, .. })
    }
}
