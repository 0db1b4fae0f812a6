//! Applying a diff to the live document.
//!
//! One transaction spans the whole batch. Per-row failures are collected
//! into the result and never abort the batch; only a failed commit does,
//! and then nothing from the batch is kept.

use crate::diff::pending_change;
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::field::FieldAccessor;
use crate::profile::{ColumnMapping, SyncProfile};
use crate::row::{ApplyError, ApplyResult, DiffResult, RowState, SyncRow};

/// Transaction name shown in the document's undo history.
pub const APPLY_TRANSACTION_NAME: &str = "Sync schedule from remote table";

/// Writes the Modified rows of a diff.
pub struct ApplyEngine;

impl ApplyEngine {
    /// Applies every Modified row of `diff`. Unchanged and Error rows are
    /// skipped.
    ///
    /// Field changes are re-checked against the document at apply time. A
    /// row with any failed field is counted as failed, but its other fields
    /// are still written and nothing already written is undone.
    pub fn apply<D: Document + ?Sized>(
        doc: &mut D,
        diff: &DiffResult,
        profile: &SyncProfile,
    ) -> CoreResult<ApplyResult> {
        let editable: Vec<&ColumnMapping> = profile.editable_mappings().collect();
        let mut result = ApplyResult::default();

        doc.begin_transaction(APPLY_TRANSACTION_NAME)?;

        for row in &diff.rows {
            if row.state() != RowState::Modified {
                result.skipped_count += 1;
                continue;
            }
            match Self::apply_row(doc, row, &editable) {
                Ok(()) => {
                    tracing::debug!(anchor = %row.anchor, "row applied");
                    result.applied_count += 1;
                }
                Err(message) => {
                    tracing::warn!(anchor = %row.anchor, %message, "row failed");
                    result.failed_count += 1;
                    result.errors.push(ApplyError {
                        anchor: row.anchor.clone(),
                        message,
                    });
                }
            }
        }

        if let Err(e) = doc.commit_transaction() {
            tracing::error!(error = %e, "apply commit failed, batch discarded");
            return Err(match e {
                CoreError::TransactionCommit { .. } => e,
                other => CoreError::transaction_commit(other.to_string()),
            });
        }

        tracing::info!(
            applied = result.applied_count,
            failed = result.failed_count,
            skipped = result.skipped_count,
            "apply committed"
        );
        Ok(result)
    }

    /// Writes every changed field of one row. Returns the joined failure
    /// messages if any field could not be written.
    fn apply_row<D: Document + ?Sized>(
        doc: &mut D,
        row: &SyncRow,
        editable: &[&ColumnMapping],
    ) -> Result<(), String> {
        let element = doc
            .element_by_anchor(&row.anchor)
            .ok_or_else(|| format!("element_not_found: no element with anchor '{}'", row.anchor))?;

        let mut failures = Vec::new();
        for mapping in editable {
            let change = match pending_change(&*doc, element, row, mapping) {
                None => continue,
                Some(Ok(change)) => change,
                Some(Err(err)) => {
                    failures.push(err.to_string());
                    continue;
                }
            };
            if let Err(err) = FieldAccessor::write(doc, element, &change.field, &change.incoming) {
                failures.push(err.to_string());
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.join("; "))
        }
    }
}
