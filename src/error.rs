//! Error types for cached query operations
//!
//! This module defines the error type shared by the caching decorator, the
//! cache stores and the query executors.

use thiserror::Error;

/// Main error type for cached query operations
#[derive(Error, Debug)]
pub enum QueryCacheError {
    /// The cache is enabled (or a cache operation was requested) but no
    /// cache store has been configured
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The underlying query execution failed
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// The cache store failed to read, write or delete an entry
    #[error("Cache store error: {0}")]
    StoreError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for cached query operations
pub type Result<T> = std::result::Result<T, QueryCacheError>;

impl From<String> for QueryCacheError {
    fn from(s: String) -> Self {
        QueryCacheError::Other(s)
    }
}

impl From<&str> for QueryCacheError {
    fn from(s: &str) -> Self {
        QueryCacheError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for QueryCacheError {
    fn from(e: serde_json::Error) -> Self {
        QueryCacheError::SerializationError(e.to_string())
    }
}

impl From<std::io::Error> for QueryCacheError {
    fn from(e: std::io::Error) -> Self {
        QueryCacheError::StoreError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = QueryCacheError::ConfigurationError("no cache store".to_string());
        assert_eq!(error.to_string(), "Configuration error: no cache store");

        let error = QueryCacheError::ExecutionError("backend unavailable".to_string());
        assert!(error.to_string().contains("backend unavailable"));

        let error = QueryCacheError::StoreError("disk full".to_string());
        assert!(error.to_string().starts_with("Cache store error"));
    }

    #[test]
    fn test_error_conversion() {
        let error: QueryCacheError = "test error".into();
        assert!(matches!(error, QueryCacheError::Other(_)));

        let error: QueryCacheError = "test error".to_string().into();
        assert!(matches!(error, QueryCacheError::Other(_)));

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: QueryCacheError = json_err.into();
        assert!(matches!(error, QueryCacheError::SerializationError(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let error: QueryCacheError = io_err.into();
        assert!(matches!(error, QueryCacheError::StoreError(_)));
    }
}
