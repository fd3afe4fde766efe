//! Error types for the OpenStack-compatible API client.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the OpenStack-compatible API client.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum OpenStackApiError {
    /// Raised when the endpoint configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Transport or decoding failure below the HTTP status layer.
    #[error("provider error: {message}")]
    Provider {
        /// Message reported by the HTTP client or decoder.
        message: String,
    },
    /// Raised when the remote API rejects a request.
    #[error("request failed with status {status}: {message}")]
    Api {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Response body, passed through for diagnostics.
        message: String,
    },
    /// Raised when a referenced server does not exist.
    #[error("server {server_id} not found")]
    ServerNotFound {
        /// Identifier that failed to resolve.
        server_id: String,
    },
}

impl From<ConfigError> for OpenStackApiError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<reqwest::Error> for OpenStackApiError {
    fn from(value: reqwest::Error) -> Self {
        Self::Provider {
            message: value.to_string(),
        }
    }
}
