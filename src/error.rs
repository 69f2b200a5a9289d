//! Error types for throttled-api
//!
//! Every failure a caller can observe is one of these variants. Request
//! failures arrive exclusively through a [`ResponseHandle`](crate::ResponseHandle);
//! the verb calls themselves never return an error.

use crate::types::Method;
use thiserror::Error;

/// The main error type for throttled-api
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP request failed: {message}")]
    TransportFailed { message: String },

    #[error("Unexpected response {status} from {method} {uri}: {body}")]
    UnexpectedStatus {
        method: Method,
        uri: String,
        status: u16,
        body: String,
    },

    // ============================================================================
    // Dispatch Errors
    // ============================================================================
    #[error("Request was dropped before a response was delivered")]
    Abandoned,

    #[error("No async runtime available: {message}")]
    Runtime { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a transport error that did not originate from reqwest
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportFailed {
            message: message.into(),
        }
    }

    /// Create an unexpected status error
    pub fn unexpected_status(
        method: Method,
        uri: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self::UnexpectedStatus {
            method,
            uri: uri.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a runtime error
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::UnexpectedStatus { status, .. } => Some(*status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error came from the transport layer
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::TransportFailed { .. })
    }
}

/// Result type alias for throttled-api
pub type Result<T> = std::result::Result<T, Error>;
