//! Error types for Parley.
//!
//! Defines the main error enum used throughout the translation pipeline.

use thiserror::Error;

/// Main error type for Parley operations.
#[derive(Error, Debug)]
pub enum ParleyError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration errors (missing credential, invalid config file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Completion endpoint errors (unreachable, timed out, no choices, etc.)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Normalization produced nothing executable from the completion text.
    #[error("Empty statement: {0}")]
    EmptyStatement(String),

    /// Statement execution errors (syntax errors, missing columns, rejected
    /// statements, etc.)
    #[error("Execution error: {0}")]
    Execution(String),
}

impl ParleyError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an upstream error with the given message.
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Creates an empty-statement error with the given message.
    pub fn empty_statement(msg: impl Into<String>) -> Self {
        Self::EmptyStatement(msg.into())
    }

    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Config(_) => "Configuration Error",
            Self::Upstream(_) => "Upstream Error",
            Self::EmptyStatement(_) => "Empty Statement",
            Self::Execution(_) => "Execution Error",
        }
    }
}

/// Result type alias using ParleyError.
pub type Result<T> = std::result::Result<T, ParleyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_connection() {
        let err = ParleyError::connection("Cannot connect to localhost:5432");
        assert_eq!(
            err.to_string(),
            "Connection error: Cannot connect to localhost:5432"
        );
        assert_eq!(err.category(), "Connection Error");
    }

    #[test]
    fn test_error_display_config() {
        let err = ParleyError::config("NVIDIA_API_KEY is not set");
        assert_eq!(
            err.to_string(),
            "Configuration error: NVIDIA_API_KEY is not set"
        );
        assert_eq!(err.category(), "Configuration Error");
    }

    #[test]
    fn test_error_display_upstream() {
        let err = ParleyError::upstream("completion returned no choices");
        assert_eq!(
            err.to_string(),
            "Upstream error: completion returned no choices"
        );
        assert_eq!(err.category(), "Upstream Error");
    }

    #[test]
    fn test_error_display_empty_statement() {
        let err = ParleyError::empty_statement("completion contained no SQL");
        assert_eq!(
            err.to_string(),
            "Empty statement: completion contained no SQL"
        );
        assert_eq!(err.category(), "Empty Statement");
    }

    #[test]
    fn test_error_display_execution() {
        let err = ParleyError::execution("column \"emal\" does not exist");
        assert_eq!(
            err.to_string(),
            "Execution error: column \"emal\" does not exist"
        );
        assert_eq!(err.category(), "Execution Error");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ParleyError>();
    }
}
