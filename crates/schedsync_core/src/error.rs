//! Error types for schedsync core.
//!
//! Two families live here. [`CoreError`] is fatal: it aborts the whole
//! invocation and is propagated to the caller. [`RowErrorCode`] and
//! [`RowError`] are row/field outcomes: they are attached to the offending
//! row, counted, and never abort a batch.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Invocation-level errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The sync profile is missing a required setting.
    #[error("invalid sync profile: {message}")]
    InvalidProfile {
        /// What is wrong with the profile.
        message: String,
    },

    /// The requested schedule does not exist in the document.
    #[error("schedule not found: {name}")]
    ScheduleNotFound {
        /// Name of the schedule.
        name: String,
    },

    /// The document contains no schedule grids at all.
    #[error("document has no schedule grids")]
    NoSchedule,

    /// A cell address fell outside the grid.
    #[error("cell out of range: {section:?} row {row}, column {col} in {schedule}")]
    CellOutOfRange {
        /// Schedule being read.
        schedule: String,
        /// Grid section.
        section: crate::document::GridSection,
        /// Row index within the section.
        row: usize,
        /// Column index.
        col: usize,
    },

    /// A document transaction could not be opened.
    #[error("transaction could not start: {reason}")]
    TransactionStart {
        /// Reason reported by the document.
        reason: String,
    },

    /// Committing the document transaction failed; nothing from the batch
    /// is retained.
    #[error("transaction commit failed: {reason}")]
    TransactionCommit {
        /// Reason reported by the document.
        reason: String,
    },

    /// Setting a field value was rejected by the document.
    #[error("field write rejected: {message}")]
    FieldWrite {
        /// Message reported by the document.
        message: String,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid profile error.
    pub fn invalid_profile(message: impl Into<String>) -> Self {
        Self::InvalidProfile {
            message: message.into(),
        }
    }

    /// Creates a schedule not found error.
    pub fn schedule_not_found(name: impl Into<String>) -> Self {
        Self::ScheduleNotFound { name: name.into() }
    }

    /// Creates a transaction start error.
    pub fn transaction_start(reason: impl Into<String>) -> Self {
        Self::TransactionStart {
            reason: reason.into(),
        }
    }

    /// Creates a transaction commit error.
    pub fn transaction_commit(reason: impl Into<String>) -> Self {
        Self::TransactionCommit {
            reason: reason.into(),
        }
    }

    /// Creates a field write error.
    pub fn field_write(message: impl Into<String>) -> Self {
        Self::FieldWrite {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}

/// Classification of a row or field level problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorCode {
    /// The row has no usable anchor.
    AnchorMissing,
    /// The anchor repeats an earlier row's anchor in the same batch.
    AnchorDuplicate,
    /// No live element matches the anchor.
    ElementNotFound,
    /// The incoming text is not valid for the field's storage kind.
    TypeMismatch,
    /// Neither the instance nor the type level field is writable.
    ParameterReadOnly,
    /// The document rejected the write.
    ApplyFailed,
}

impl RowErrorCode {
    /// Returns the stable wire code.
    pub fn as_str(&self) -> &'static str {
        match self {
            RowErrorCode::AnchorMissing => "anchor_missing",
            RowErrorCode::AnchorDuplicate => "anchor_duplicate",
            RowErrorCode::ElementNotFound => "element_not_found",
            RowErrorCode::TypeMismatch => "type_mismatch",
            RowErrorCode::ParameterReadOnly => "parameter_read_only",
            RowErrorCode::ApplyFailed => "apply_failed",
        }
    }
}

impl fmt::Display for RowErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row or field level error attached to a [`SyncRow`](crate::SyncRow).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// Error classification.
    pub code: RowErrorCode,
    /// Human-readable detail.
    pub message: String,
}

impl RowError {
    /// Creates a new row error.
    pub fn new(code: RowErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_error_codes_are_snake_case() {
        assert_eq!(RowErrorCode::AnchorMissing.as_str(), "anchor_missing");
        assert_eq!(RowErrorCode::ParameterReadOnly.to_string(), "parameter_read_only");

        let json = serde_json::to_string(&RowErrorCode::AnchorDuplicate).unwrap();
        assert_eq!(json, "\"anchor_duplicate\"");
    }

    #[test]
    fn error_display() {
        let err = CoreError::invalid_profile("remote_tab_name is empty");
        assert_eq!(
            err.to_string(),
            "invalid sync profile: remote_tab_name is empty"
        );

        let err = RowError::new(RowErrorCode::TypeMismatch, "Length expects a real number");
        assert_eq!(err.to_string(), "type_mismatch: Length expects a real number");
    }
}
