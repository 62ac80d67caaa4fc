//! Client error types.

use thiserror::Error;
use upnext_providers::AuthError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Authorization or calendar query failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Auth(e) => e.category().as_str(),
            Self::Http(_) => "http",
            Self::Io(_) => "io",
        }
    }
}
