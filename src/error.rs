//! Error types for db-relay.
//!
//! Defines the main error enum used throughout the connector.

use thiserror::Error;

/// Main error type for db-relay operations.
///
/// The `Execution` variant renders with the `"Query failed "` prefix; callers
/// (and the hosting workflow engine) match on that exact text, so it is part
/// of the observable contract.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Cancellation was observed before or during execution.
    #[error("operation cancelled")]
    Cancelled,

    /// Connection open failures (bad connection string, host unreachable, auth).
    #[error("Connection error: {0}")]
    Connection(String),

    /// Failures during parameter binding, statement execution, or commit.
    #[error("Query failed {0}")]
    Execution(String),

    /// Invalid or unsupported output-format selection.
    #[error("Format error: {0}")]
    Format(String),

    /// Configuration errors (invalid config file, malformed input values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Output-file write failures.
    #[error("File output error: {0}")]
    Io(String),
}

impl RelayError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a format error with the given message.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a file-output error with the given message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Cancelled => "Cancelled",
            Self::Connection(_) => "Connection Error",
            Self::Execution(_) => "Execution Error",
            Self::Format(_) => "Format Error",
            Self::Config(_) => "Configuration Error",
            Self::Io(_) => "File Output Error",
        }
    }
}

/// Result type alias using RelayError.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_keeps_contract_prefix() {
        let err = RelayError::execution("Table 'test.tablex' doesn't exist");
        assert!(err.to_string().starts_with("Query failed "));
        assert_eq!(
            err.to_string(),
            "Query failed Table 'test.tablex' doesn't exist"
        );
    }

    #[test]
    fn test_connection_error_surfaces_driver_text() {
        let err = RelayError::connection("Access denied for user 'root'@'localhost'");
        assert_eq!(
            err.to_string(),
            "Connection error: Access denied for user 'root'@'localhost'"
        );
        assert_eq!(err.category(), "Connection Error");
    }

    #[test]
    fn test_cancelled_display() {
        assert_eq!(RelayError::Cancelled.to_string(), "operation cancelled");
        assert_eq!(RelayError::Cancelled.category(), "Cancelled");
    }

    #[test]
    fn test_format_and_config_display() {
        assert_eq!(
            RelayError::format("no file path given").to_string(),
            "Format error: no file path given"
        );
        assert_eq!(
            RelayError::config("missing field 'separator'").to_string(),
            "Configuration error: missing field 'separator'"
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RelayError>();
    }
}
