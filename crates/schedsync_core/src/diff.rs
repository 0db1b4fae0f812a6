//! Field-level diff between incoming rows and the live document.
//!
//! Diffing never mutates the document. Each row is classified on its own,
//! and every editable mapping of a row is evaluated even after one of them
//! fails, so the report lists every bad field at once.

use crate::document::{Document, ElementRef};
use crate::error::RowErrorCode;
use crate::field::FieldAccessor;
use crate::profile::{ColumnMapping, SyncProfile};
use crate::row::{DiffResult, FieldChange, RowState, SyncRow};

/// Classifies incoming rows as Unchanged, Modified or Error.
pub struct DiffEngine;

impl DiffEngine {
    /// Diffs `incoming` against `doc`. The result owns fresh copies of the
    /// rows; running it twice on the same inputs yields the same result.
    pub fn diff<D: Document + ?Sized>(
        doc: &D,
        incoming: &[SyncRow],
        profile: &SyncProfile,
    ) -> DiffResult {
        let editable: Vec<&ColumnMapping> = profile.editable_mappings().collect();
        let rows: Vec<SyncRow> = incoming
            .iter()
            .map(|row| Self::diff_row(doc, row.clone(), &editable))
            .collect();

        let result = DiffResult::from_rows(rows);
        tracing::info!(
            rows = result.rows.len(),
            changed = result.changed_count,
            errors = result.error_count,
            "diff complete"
        );
        result
    }

    fn diff_row<D: Document + ?Sized>(
        doc: &D,
        mut row: SyncRow,
        editable: &[&ColumnMapping],
    ) -> SyncRow {
        row.clear_changes();

        if !row.errors().is_empty() {
            tracing::debug!(anchor = %row.anchor, "row carries read-time errors");
            return row;
        }
        if row.anchor.trim().is_empty() {
            row.push_error(RowErrorCode::AnchorMissing, "row has no anchor");
            return row;
        }

        let Some(element) = doc.element_by_anchor(&row.anchor) else {
            let message = format!("no element with anchor '{}'", row.anchor);
            row.push_error(RowErrorCode::ElementNotFound, message);
            tracing::warn!(anchor = %row.anchor, "element not found");
            return row;
        };

        for mapping in editable {
            match pending_change(doc, element, &row, mapping) {
                Some(Ok(change)) => row.push_change(change),
                Some(Err(err)) => {
                    tracing::warn!(anchor = %row.anchor, column = %mapping.sheet_column, error = %err, "field rejected");
                    row.push_error(err.code, err.message);
                }
                None => {}
            }
        }

        if row.state() == RowState::Modified {
            tracing::debug!(anchor = %row.anchor, fields = row.changes().len(), "row modified");
        }
        row
    }
}

/// Compares one mapped field. `None` if the row has no value for the column
/// or the value matches the document. Otherwise the change, or the reason
/// it cannot be written.
pub(crate) fn pending_change<D: Document + ?Sized>(
    doc: &D,
    element: ElementRef,
    row: &SyncRow,
    mapping: &ColumnMapping,
) -> Option<Result<FieldChange, crate::error::RowError>> {
    let incoming = row.cells.get(&mapping.sheet_column)?;
    let current = FieldAccessor::read(doc, element, &mapping.document_field).unwrap_or_default();
    if current == incoming {
        return None;
    }

    Some(
        FieldAccessor::validate(doc, element, &mapping.document_field, incoming).map(|()| {
            FieldChange {
                column: mapping.sheet_column.clone(),
                field: mapping.document_field.clone(),
                current,
                incoming: incoming.to_string(),
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;
    use crate::value::{FieldValue, StorageKind};

    fn document() -> MemoryDocument {
        let mut doc = MemoryDocument::new();
        let wall = doc.add_element("uid-1");
        doc.set_initial(wall, "Length", StorageKind::Real, FieldValue::Real(10.0));
        doc.set_initial(wall, "Count", StorageKind::Integer, FieldValue::Integer(1));
        doc.set_initial(wall, "Mark", StorageKind::Text, FieldValue::Text("W1".into()));
        doc.set_initial_read_only(wall, "Area", StorageKind::Real, FieldValue::Real(30.0));
        doc
    }

    fn profile() -> SyncProfile {
        SyncProfile::new("t", "Walls", "SyncId")
            .with_mapping(ColumnMapping::new("Length", "Length"))
            .with_mapping(ColumnMapping::new("Count", "Count"))
            .with_mapping(ColumnMapping::new("Mark", "Mark"))
            .with_mapping(ColumnMapping::new("Area", "Area"))
    }

    #[test]
    fn changed_editable_field_is_modified() {
        let doc = document();
        let rows = vec![SyncRow::new("uid-1").with_cell("Length", "12.5")];
        let result = DiffEngine::diff(&doc, &rows, &profile());

        assert_eq!(result.changed_count, 1);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.rows[0].state(), RowState::Modified);
        assert_eq!(
            result.rows[0].changes(),
            &[FieldChange {
                column: "Length".into(),
                field: "Length".into(),
                current: "10.0".into(),
                incoming: "12.5".into(),
            }]
        );
    }

    #[test]
    fn non_editable_mapping_is_never_a_change() {
        let doc = document();
        let mut profile = profile();
        profile.mappings[0].editable = false;

        let rows = vec![SyncRow::new("uid-1").with_cell("Length", "12.5")];
        let result = DiffEngine::diff(&doc, &rows, &profile);
        assert_eq!(result.changed_count, 0);
        assert_eq!(result.rows[0].state(), RowState::Unchanged);
    }

    #[test]
    fn protected_column_is_never_a_change() {
        let doc = document();
        let profile = profile().with_protected_column("Mark");
        let rows = vec![SyncRow::new("uid-1").with_cell("Mark", "W9")];
        let result = DiffEngine::diff(&doc, &rows, &profile);
        assert_eq!(result.changed_count, 0);
    }

    #[test]
    fn identical_text_is_unchanged() {
        let doc = document();
        let rows = vec![SyncRow::new("uid-1")
            .with_cell("Length", "10.0")
            .with_cell("Count", "1")
            .with_cell("Unmapped", "anything")];
        let result = DiffEngine::diff(&doc, &rows, &profile());
        assert_eq!(result.unchanged_count, 1);
        assert!(result.is_clean());
    }

    #[test]
    fn every_bad_field_is_reported() {
        let doc = document();
        let rows = vec![SyncRow::new("uid-1")
            .with_cell("Length", "long")
            .with_cell("Count", "")
            .with_cell("Mark", "W2")
            .with_cell("Area", "31.0")];
        let result = DiffEngine::diff(&doc, &rows, &profile());

        let row = &result.rows[0];
        assert_eq!(row.state(), RowState::Error);
        let codes: Vec<_> = row.errors().iter().map(|e| e.code).collect();
        assert_eq!(
            codes,
            vec![
                RowErrorCode::TypeMismatch,
                RowErrorCode::TypeMismatch,
                RowErrorCode::ParameterReadOnly
            ]
        );
        // The valid Mark change was still found.
        assert_eq!(row.changes().len(), 1);
    }

    #[test]
    fn unknown_anchor_is_element_not_found() {
        let doc = document();
        let rows = vec![SyncRow::new("uid-404").with_cell("Length", "1.0")];
        let result = DiffEngine::diff(&doc, &rows, &profile());
        assert!(result.rows[0].has_error(RowErrorCode::ElementNotFound));
        assert_eq!(result.rows[0].errors().len(), 1);
    }

    #[test]
    fn read_time_errors_are_preserved() {
        let doc = document();
        let mut dup = SyncRow::new("uid-1").with_cell("Length", "12.5");
        dup.push_error(RowErrorCode::AnchorDuplicate, "repeats row 1");
        let blank = SyncRow::new("  ");

        let result = DiffEngine::diff(&doc, &[dup, blank], &profile());
        assert_eq!(result.error_count, 2);
        assert!(result.rows[0].has_error(RowErrorCode::AnchorDuplicate));
        assert!(result.rows[0].changes().is_empty());
        assert!(result.rows[1].has_error(RowErrorCode::AnchorMissing));
    }

    #[test]
    fn diff_is_repeatable() {
        let doc = document();
        let rows = vec![
            SyncRow::new("uid-1").with_cell("Length", "12.5"),
            SyncRow::new("nope"),
        ];
        let first = DiffEngine::diff(&doc, &rows, &profile());
        let second = DiffEngine::diff(&doc, &rows, &profile());
        assert_eq!(first, second);
    }
}
