//! Error types for authorization and calendar queries.
//!
//! Every failure belongs to exactly one [`ErrorCategory`]. Only
//! [`ErrorCategory::CredentialRead`] is absorbed locally (it means "authorize
//! again"); every other category reaches the caller.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Boxed underlying cause.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// High-level classification of an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The cached credential file is missing, unreadable or malformed.
    CredentialRead,
    /// The provisioning file is missing, unreadable or malformed.
    Provisioning,
    /// The interactive consent flow failed or was cancelled.
    InteractiveFlow,
    /// The credential file could not be written.
    CredentialWrite,
    /// The remote calendar query failed.
    RemoteQuery,
}

impl ErrorCategory {
    /// Returns a stable machine-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CredentialRead => "credential_read",
            Self::Provisioning => "provisioning",
            Self::InteractiveFlow => "interactive_flow",
            Self::CredentialWrite => "credential_write",
            Self::RemoteQuery => "remote_query",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised while authorizing or querying the calendar.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Reading or parsing the cached credential failed.
    #[error("cannot read credential file {}: {message}", path.display())]
    CredentialRead {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Reading or parsing the provisioning file failed.
    #[error("cannot use provisioning file {}: {message}", path.display())]
    Provisioning {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The interactive authorization did not complete.
    #[error("interactive authorization failed: {message}")]
    InteractiveFlow {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Persisting the credential failed.
    #[error("cannot write credential file {}: {message}", path.display())]
    CredentialWrite {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The calendar service rejected or failed the query.
    #[error("calendar query failed: {message}")]
    RemoteQuery {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl AuthError {
    /// Creates a credential read error.
    pub fn credential_read(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::CredentialRead {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a provisioning error.
    pub fn provisioning(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Provisioning {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates an interactive flow error.
    pub fn interactive(message: impl Into<String>) -> Self {
        Self::InteractiveFlow {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a credential write error.
    pub fn credential_write(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::CredentialWrite {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a remote query error.
    pub fn remote_query(message: impl Into<String>) -> Self {
        Self::RemoteQuery {
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let slot = match &mut self {
            Self::CredentialRead { source, .. }
            | Self::Provisioning { source, .. }
            | Self::InteractiveFlow { source, .. }
            | Self::CredentialWrite { source, .. }
            | Self::RemoteQuery { source, .. } => source,
        };
        *slot = Some(Box::new(cause));
        self
    }

    /// Returns the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::CredentialRead { .. } => ErrorCategory::CredentialRead,
            Self::Provisioning { .. } => ErrorCategory::Provisioning,
            Self::InteractiveFlow { .. } => ErrorCategory::InteractiveFlow,
            Self::CredentialWrite { .. } => ErrorCategory::CredentialWrite,
            Self::RemoteQuery { .. } => ErrorCategory::RemoteQuery,
        }
    }

    /// Returns the human-readable message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::CredentialRead { message, .. }
            | Self::Provisioning { message, .. }
            | Self::InteractiveFlow { message, .. }
            | Self::CredentialWrite { message, .. }
            | Self::RemoteQuery { message, .. } => message,
        }
    }
}

/// A specialized Result type for authorization operations.
pub type AuthResult<T> = Result<T, AuthError>;
