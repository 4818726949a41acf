//! Error types for the AbraFlexi client.

use crate::winstrom;

/// Result type for client operations.
pub type AbraFlexiResult<T> = Result<T, AbraFlexiError>;

/// Error types that can occur when talking to an AbraFlexi server.
#[derive(Debug, thiserror::Error)]
pub enum AbraFlexiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server rejected the request.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl AbraFlexiError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Create an error from a non-success status code and response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| winstrom::error_message(&value))
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    trimmed.to_string()
                }
            });

        match status {
            401 | 403 => Self::Authentication(message),
            404 => Self::NotFound(message),
            _ => Self::Api { status, message },
        }
    }
}
