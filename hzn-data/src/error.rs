//! Error types for the Horizon data layer.
//!
//! This module defines all error types that can occur while talking
//! to a subgraph, over HTTP or over a subscription socket.

use thiserror::Error;

/// Errors that can occur during subgraph queries and subscriptions.
#[derive(Debug, Error)]
pub enum HznDataError {
    /// HTTP transport or network error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The subgraph answered with a non-success status code.
    #[error("Subgraph returned HTTP {status}")]
    HttpStatus {
        /// Status code returned by the endpoint
        status: u16,
    },

    /// Request kept failing with transient errors.
    #[error("Request timed out after {attempts} attempts")]
    Timeout {
        /// Number of attempts made
        attempts: u32,
    },

    /// The subgraph reported GraphQL errors.
    #[error("Subgraph error: {0}")]
    Graph(String),

    /// The response did not contain the queried entity.
    #[error("Entity '{0}' missing from subgraph response")]
    MissingEntity(String),

    /// An entity could not be decoded into its record type.
    #[error("Failed to decode '{entity}': {reason}")]
    Decode {
        /// The entity being decoded
        entity: String,
        /// Underlying decoder message
        reason: String,
    },

    /// WebSocket transport error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The subscription server broke the graphql-ws protocol.
    #[error("Subscription protocol error: {0}")]
    Protocol(String),

    /// The configured endpoint is not a usable URL.
    #[error("Invalid endpoint '{0}'")]
    InvalidEndpoint(String),
}

impl HznDataError {
    /// Whether the error is transient and the request should be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            HznDataError::Http(msg) => {
                msg.contains("timed out")
                    || msg.contains("timeout")
                    || msg.contains("connect")
                    || msg.contains("connection")
            }
            HznDataError::HttpStatus { status } => *status == 429 || *status >= 500,
            HznDataError::WebSocket(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for HznDataError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return HznDataError::HttpStatus {
                status: status.as_u16(),
            };
        }
        if err.is_timeout() {
            return HznDataError::Http(format!("request timed out: {}", err));
        }
        if err.is_connect() {
            return HznDataError::Http(format!("connection failed: {}", err));
        }
        HznDataError::Http(err.to_string())
    }
}

/// Result type alias for data layer operations.
pub type Result<T> = std::result::Result<T, HznDataError>;
