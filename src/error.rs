//! Error types for the deskbridge gateway

use thiserror::Error;

/// Result type alias for deskbridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the deskbridge gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (fatal at startup)
    #[error("configuration error: {0}")]
    Config(String),

    /// Inbound event failed validation (bad secret or group id)
    #[error("validation failure: {0}")]
    Validation(String),

    /// Remote API call failed (network, timeout, or non-2xx)
    #[error("remote failure at {endpoint}: {status} - {body}")]
    Remote {
        /// Endpoint that was called
        endpoint: String,
        /// HTTP status code (0 for transport-level failures)
        status: u16,
        /// Response body or transport error text
        body: String,
    },

    /// Malformed inbound envelope
    #[error("protocol failure: {0}")]
    Protocol(String),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Build a `Remote` error from an endpoint and a failed response
    #[must_use]
    pub fn remote(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Remote {
            endpoint: endpoint.into(),
            status,
            body: body.into(),
        }
    }

    /// Build a `Remote` error for a transport-level failure (no HTTP status)
    #[must_use]
    pub fn transport(endpoint: impl Into<String>, source: &reqwest::Error) -> Self {
        Self::Remote {
            endpoint: endpoint.into(),
            status: 0,
            body: source.to_string(),
        }
    }
}
