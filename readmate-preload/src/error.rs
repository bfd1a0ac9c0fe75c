//! Error types for chapter fetching and preloading
//!
//! Cache operations never fail; these errors come from the content fetch
//! path (network, server, decoding, deadlines) and from explicit
//! configuration loading.

use thiserror::Error;

/// Main error type for readmate-preload operations
#[derive(Error, Debug)]
pub enum PreloadError {
    /// Generic fetch failure reported by a content fetcher
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// Speculative fetch exceeded its deadline
    #[error("Operation timed out after {timeout_ms}ms: {context}")]
    TimeoutError { timeout_ms: u64, context: String },

    /// Transport failure talking to the reader server
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The reader server answered with an unsuccessful envelope
    #[error("API error: {0}")]
    ApiError(String),

    /// Response body could not be decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for readmate-preload operations
pub type Result<T> = std::result::Result<T, PreloadError>;

impl From<String> for PreloadError {
    fn from(s: String) -> Self {
        PreloadError::Other(s)
    }
}

impl From<&str> for PreloadError {
    fn from(s: &str) -> Self {
        PreloadError::Other(s.to_string())
    }
}

impl PreloadError {
    /// Whether this error came from a missed deadline rather than the fetch itself
    pub fn is_timeout(&self) -> bool {
        matches!(self, PreloadError::TimeoutError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = PreloadError::FetchError("connection reset".to_string());
        assert_eq!(error.to_string(), "Fetch error: connection reset");

        let timeout_error = PreloadError::TimeoutError {
            timeout_ms: 30_000,
            context: "preload book#3".to_string(),
        };
        assert!(timeout_error.to_string().contains("timed out after 30000ms"));
        assert!(timeout_error.to_string().contains("book#3"));

        let api_error = PreloadError::ApiError("book not found".to_string());
        assert_eq!(api_error.to_string(), "API error: book not found");
    }

    #[test]
    fn test_error_conversion() {
        let error: PreloadError = "test error".into();
        assert!(matches!(error, PreloadError::Other(_)));

        let error: PreloadError = "test error".to_string().into();
        assert!(matches!(error, PreloadError::Other(_)));
    }

    #[test]
    fn test_is_timeout() {
        let timeout = PreloadError::TimeoutError {
            timeout_ms: 10,
            context: "x".to_string(),
        };
        assert!(timeout.is_timeout());
        assert!(!PreloadError::FetchError("x".to_string()).is_timeout());
    }
}
