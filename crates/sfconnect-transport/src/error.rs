//! Transport error types

use std::fmt;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Network-level failures reported by a transport.
///
/// A response that arrives, whatever its status code, is not an error at
/// this layer.
#[derive(Debug)]
pub enum TransportError {
    /// HTTP request/response error
    Http(String),

    /// Connection error
    Connection(String),

    /// Timeout error
    Timeout,

    /// Unsupported or malformed request
    InvalidRequest(String),

    /// Serialization error
    Serialization(String),

    /// Generic transport error
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(msg) => write!(f, "HTTP error: {}", msg),
            Self::Connection(msg) => write!(f, "Connection error: {}", msg),
            Self::Timeout => write!(f, "Timeout"),
            Self::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            Self::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
