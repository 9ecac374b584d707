//! Error types and handling
//!
//! This module provides the error types used throughout the Leafdoc engine.
//! All errors implement the `LeafdocErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Error messages never carry API keys. Hints are safe to show to end users;
//! the `Display` text is meant for logs.

use thiserror::Error;

/// Trait for Leafdoc error extensions
///
/// Provides additional context for errors, including user-friendly hints
/// and recoverability information.
pub trait LeafdocErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint never contains secrets or internal implementation details.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors require fixing the installation or configuration first.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Database**: SQLite operation failures
/// - **Seed**: Knowledge base seed data that cannot be read or decoded
/// - **Oracle**: Failures talking to the external language model
/// - **Keyring**: API key lookup failures
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, LeafdocErrorExt};
///
/// let error = EngineError::Oracle("connection refused".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::Config("unknown provider".to_string());
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    // Seed data errors
    #[error("Seed data error: {0}")]
    Seed(String),

    // Oracle errors
    #[error("Oracle error: {0}")]
    Oracle(String),

    #[error("Oracle call timed out")]
    OracleTimeout,

    // Keyring errors
    #[error("Keyring error: {0}")]
    KeyringError(String),

    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LeafdocErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Database(_) => "Knowledge base operation failed. Try restarting leafdoc",
            Self::Seed(_) => "Check that the seed file is valid JSON with a 'diseases' list",
            Self::Oracle(_) => "The AI service is unavailable. Check your API key and network",
            Self::OracleTimeout => "The AI service took too long to respond. Try again",
            Self::KeyringError(_) => "Failed to access secure storage. Check system keychain",
            Self::MissingApiKey(_) => {
                "Set the API key in the environment or run 'leafdoc secret set'"
            }
            Self::Network(_) => "Network operation failed. Check your connection",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Config(_) | Self::Seed(_) | Self::MissingApiKey(_)
        )
    }
}
