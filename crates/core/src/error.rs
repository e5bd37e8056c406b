//! Error types for the clinidocs CLI.
//!
//! This module defines a unified error enum covering all error categories
//! in the application: credentials, remote store operations, ingestion,
//! query/model output, configuration, and I/O.
//!
//! The remote clients produce these variants directly. Downstream code
//! matches on the variant, never on substrings of a stringified error.

use thiserror::Error;

/// Unified error type for the clinidocs CLI.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// API key absent from the process environment
    #[error("API key not found in environment")]
    CredentialMissing,

    /// API key present but rejected by the remote service
    #[error("API key verification failed: {0}")]
    CredentialInvalid(String),

    /// Remote store create/delete/list failures
    #[error("Remote operation failed: {0}")]
    RemoteOperation(String),

    /// Remote resource does not exist (HTTP 404)
    #[error("Remote resource not found: {0}")]
    NotFound(String),

    /// Network or protocol failure talking to the remote API
    #[error("Transport error: {0}")]
    Transport(String),

    /// Query issued with an empty store selection
    #[error("No knowledge store selected")]
    NoStoreSelected,

    /// Model output that failed JSON parsing or schema validation
    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    /// Upload, import, or poll failure for a single document
    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    /// Import operation still pending after the poll budget was exhausted
    #[error("Ingestion timed out after {attempts} poll attempts")]
    IngestionTimedOut { attempts: u32 },

    /// Ingestion aborted by the caller's cancellation token
    #[error("Ingestion cancelled")]
    IngestionCancelled,

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl AppError {
    /// Human-readable message for connection failures, shown on the
    /// welcome/error screen. Raw error detail goes to the log, not the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::CredentialMissing => "API key not detected. Please select a valid key.",
            AppError::CredentialInvalid(_) | AppError::NotFound(_) => {
                "API key verification failed. Please try selecting your key again."
            }
            _ => "Failed to initialize session. Please try again.",
        }
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_missing_key() {
        let msg = AppError::CredentialMissing.user_message();
        assert!(msg.contains("not detected"));
    }

    #[test]
    fn test_user_message_invalid_key() {
        let msg = AppError::CredentialInvalid("401".to_string()).user_message();
        assert!(msg.contains("selecting your key again"));

        // A 404 during store discovery maps to the same reselect message
        let msg = AppError::NotFound("fileSearchStores/x".to_string()).user_message();
        assert!(msg.contains("selecting your key again"));
    }

    #[test]
    fn test_user_message_generic() {
        let msg = AppError::Transport("connection reset".to_string()).user_message();
        assert!(msg.contains("try again"));
    }

    #[test]
    fn test_display_timed_out() {
        let err = AppError::IngestionTimedOut { attempts: 120 };
        assert_eq!(
            err.to_string(),
            "Ingestion timed out after 120 poll attempts"
        );
    }
}
