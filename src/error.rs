//! Error types for the mail-to-sheet sync.
//!
//! Errors are split by how the sync driver reacts to them: see
//! [`SyncError::is_fatal`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`SyncError`].
pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Credentials are missing, invalid or could not be refreshed.
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// The message disappeared between listing and fetching.
    #[error("message {id} not found")]
    NotFound { id: String },

    /// Transport, quota or permission failure talking to a remote service.
    #[error("{operation} failed: {message}")]
    Remote { operation: String, message: String },

    /// The sync state file exists but could not be read as a watermark.
    #[error("sync state at {} is unreadable: {reason}", path.display())]
    StateCorrupt { path: PathBuf, reason: String },

    /// The configuration cannot be used as given.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// Local file I/O failed.
    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    pub fn auth(message: impl Into<String>) -> Self {
        SyncError::Auth {
            message: message.into(),
        }
    }

    pub fn remote(operation: impl Into<String>, message: impl ToString) -> Self {
        SyncError::Remote {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        SyncError::Config {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    /// Fatal errors abort the run; everything else is recovered per candidate.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            SyncError::Auth { .. } | SyncError::Config { .. } | SyncError::Io { .. } => true,
            SyncError::NotFound { .. }
            | SyncError::Remote { .. }
            | SyncError::StateCorrupt { .. } => false,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        let operation = e
            .url()
            .map(|u| format!("request to {}", u.path()))
            .unwrap_or_else(|| "request".to_string());
        SyncError::Remote {
            operation,
            message: e.to_string(),
        }
    }
}
