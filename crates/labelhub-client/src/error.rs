//! Error types for the LabelHub client
//!
//! [`crate::api::ApiError`] covers a single API call. `ClientError` is the
//! application-level error returned by configuration loading, the token store
//! and CLI commands, with messages that tell the user what to check.

use crate::api::ApiError;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The API call itself failed; the message is the server's when it sent one
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check LABELHUB_* environment variables or the config file.")]
    Config(String),

    /// Local token store could not be read
    #[error("Token store error: {0}. Sign in again to rewrite the token store.")]
    TokenStore(String),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions.")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("Failed to parse config file: {0}. Check the TOML syntax.")]
    TomlParse(#[from] toml::de::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Invalid command-line input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClientError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn token_store(msg: impl Into<String>) -> Self {
        Self::TokenStore(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
