//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a sync operation.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or transport error talking to the remote table.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The remote table is not reachable.
    #[error("not connected to remote table")]
    NotConnected,

    /// The remote table or tab does not exist.
    #[error("remote table not found: {table_id}/{tab_name}")]
    TableNotFound {
        /// Remote table id.
        table_id: String,
        /// Tab name.
        tab_name: String,
    },

    /// Document-side failure, including invalid profiles and commit
    /// failures.
    #[error("core error: {0}")]
    Core(#[from] schedsync_core::CoreError),

    /// Remote data could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// I/O error in a file-backed remote table.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation was cancelled before any write started.
    #[error("sync cancelled")]
    Cancelled,

    /// Invalid state transition.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::NotConnected => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Codec(e.to_string())
    }
}
