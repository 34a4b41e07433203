//! Error types for Walltaker.
//!
//! Each concern owns a narrow error enum (`ConfigError`, `FetchError`, ...).
//! They converge here into [`WalltakerError`], which is what the binary entry
//! point reports before exiting with a non-zero status.

use thiserror::Error;

use crate::agent::lifecycle::LifecycleError;
use crate::config::ConfigError;
use crate::feed::FetchError;

/// Errors that can stop the agent or a CLI command.
#[derive(Debug, Error)]
pub enum WalltakerError {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// Configuration could not be loaded or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Feed request failed.
    #[error("Feed error: {0}")]
    Feed(#[from] FetchError),
    /// Startup or shutdown of the agent failed.
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),
    /// HTTP client could not be built.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_arguments_display() {
        let err = WalltakerError::InvalidArguments("feed must be numeric".to_string());
        assert_eq!(err.to_string(), "feed must be numeric");
    }

    #[test]
    fn test_config_error_display() {
        let err: WalltakerError = ConfigError::InvalidInterval(0).into();
        let msg = err.to_string();
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("interval"));
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err: WalltakerError = io_err.into();
        assert!(matches!(err, WalltakerError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_error_is_debug() {
        let err = WalltakerError::InvalidArguments("test".to_string());
        assert!(format!("{err:?}").contains("InvalidArguments"));
    }
}
