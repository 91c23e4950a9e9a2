//! Error types for the Chairside client data layer

use thiserror::Error;

/// Result type alias for Chairside operations
pub type ChairsideResult<T> = Result<T, ChairsideError>;

/// Main error type for the Chairside client data layer
///
/// Errors are deliberately `Clone`: read-path failures are retained inside
/// shared cache entries and broadcast to every deduplicated waiter, so the
/// payloads are owned strings and scalars rather than source errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChairsideError {
    /// Request could not be sent or the response never arrived
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-2xx status; the body is opaque
    #[error("HTTP {status} from {endpoint}")]
    Http { status: u16, endpoint: String },

    /// Response body did not parse as the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Durable local storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ChairsideError {
    /// Create a new network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create a new HTTP status error
    pub fn http(status: u16, endpoint: impl Into<String>) -> Self {
        Self::Http {
            status,
            endpoint: endpoint.into(),
        }
    }

    /// Create a new decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Whether this error is a non-2xx response with the given status
    pub fn is_http_status(&self, code: u16) -> bool {
        matches!(self, Self::Http { status, .. } if *status == code)
    }
}

impl From<reqwest::Error> for ChairsideError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else if let Some(status) = error.status() {
            Self::Http {
                status: status.as_u16(),
                endpoint: error
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "<unknown>".to_string()),
            }
        } else {
            Self::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for ChairsideError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

impl From<std::io::Error> for ChairsideError {
    fn from(error: std::io::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display() {
        let err = ChairsideError::http(404, "/api/patients/7/medical-notes");
        assert_eq!(err.to_string(), "HTTP 404 from /api/patients/7/medical-notes");
        assert!(err.is_http_status(404));
        assert!(!err.is_http_status(500));
    }

    #[test]
    fn test_json_error_maps_to_decode() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{truncated").unwrap_err();
        let err: ChairsideError = parse_err.into();
        assert!(matches!(err, ChairsideError::Decode(_)));
    }
}
