//! Row-level reads and writes on top of a [`RemoteTable`].
//!
//! Reading turns the remote matrix into [`SyncRow`]s and flags rows whose
//! anchor is blank or repeats an earlier row. Writing always clears the tab
//! first and then writes one header row plus the data rows. The two steps
//! are not atomic: a failure in between leaves the tab empty.

use crate::error::SyncResult;
use crate::remote::{RemoteTable, ValueMatrix};
use schedsync_core::{
    dedup_headers, ElementRef, RowErrorCode, SyncProfile, SyncRow, ELEMENT_ID_COLUMN,
};
use serde::Serialize;
use std::collections::HashMap;

/// Rows read from the remote table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteRows {
    /// Unique column keys.
    pub headers: Vec<String>,
    /// Data rows, including rows flagged with read-time errors.
    pub rows: Vec<SyncRow>,
}

/// Outcome of writing rows to the remote table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteResult {
    /// Header row that was written.
    pub header: Vec<String>,
    /// Number of data rows written.
    pub rows_written: usize,
    /// Number of cells written, header included.
    pub cells_written: usize,
}

/// Parses a remote matrix into rows.
pub fn parse_rows(profile: &SyncProfile, matrix: &[Vec<String>], skip_blank_rows: bool) -> RemoteRows {
    let Some((header_row, data)) = matrix.split_first() else {
        return RemoteRows::default();
    };

    let headers = dedup_headers(header_row);
    let anchor_idx = column_index(&headers, &profile.anchor_column);
    let element_idx = column_index(&headers, ELEMENT_ID_COLUMN);
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    let mut rows = Vec::with_capacity(data.len());

    for (i, raw) in data.iter().enumerate() {
        // Header is sheet row 1.
        let sheet_row = i + 2;
        let cell = |idx: usize| raw.get(idx).map(String::as_str).unwrap_or("");

        if skip_blank_rows && raw.iter().all(|c| c.trim().is_empty()) {
            continue;
        }

        let anchor = anchor_idx.map(|idx| cell(idx).trim()).unwrap_or("");
        let mut row = SyncRow::new(anchor);
        row.element_ref = element_idx
            .and_then(|idx| cell(idx).trim().parse::<i64>().ok())
            .map(ElementRef);
        for (idx, header) in headers.iter().enumerate() {
            row.cells.insert(header.clone(), cell(idx));
        }

        if anchor.is_empty() {
            row.push_error(
                RowErrorCode::AnchorMissing,
                format!("row {} has no value in column '{}'", sheet_row, profile.anchor_column),
            );
        } else if let Some(first) = first_seen.get(anchor) {
            row.push_error(
                RowErrorCode::AnchorDuplicate,
                format!("row {} repeats the anchor of row {}", sheet_row, first),
            );
        } else {
            first_seen.insert(anchor.to_string(), sheet_row);
        }

        rows.push(row);
    }

    RemoteRows { headers, rows }
}

/// Builds the header and data matrix for `rows`.
///
/// The header is the anchor column, the element id column, every mapped
/// sheet column, then any other cell keys found on the rows. Anchor and
/// element id values always come from the row's own fields.
pub fn build_matrix(profile: &SyncProfile, rows: &[SyncRow]) -> ValueMatrix {
    let mut header: Vec<String> = Vec::new();
    push_unique(&mut header, &profile.anchor_column);
    push_unique(&mut header, ELEMENT_ID_COLUMN);
    for mapping in &profile.mappings {
        push_unique(&mut header, &mapping.sheet_column);
    }
    for row in rows {
        for key in row.cells.keys() {
            push_unique(&mut header, key);
        }
    }

    let mut matrix = Vec::with_capacity(rows.len() + 1);
    for row in rows {
        let line = header
            .iter()
            .map(|h| {
                if h.eq_ignore_ascii_case(&profile.anchor_column) {
                    row.anchor.clone()
                } else if h.eq_ignore_ascii_case(ELEMENT_ID_COLUMN) {
                    row.element_ref.map(|e| e.to_string()).unwrap_or_default()
                } else {
                    row.cells.get(h).unwrap_or("").to_string()
                }
            })
            .collect();
        matrix.push(line);
    }
    matrix.insert(0, header);
    matrix
}

/// Reads and parses the profile's remote tab.
pub fn read_rows<R: RemoteTable + ?Sized>(
    remote: &R,
    profile: &SyncProfile,
    skip_blank_rows: bool,
) -> SyncResult<RemoteRows> {
    let matrix = remote.read_values(&profile.remote_table_id, &profile.remote_tab_name)?;
    let parsed = parse_rows(profile, &matrix, skip_blank_rows);
    tracing::debug!(
        table = %profile.remote_table_id,
        tab = %profile.remote_tab_name,
        rows = parsed.rows.len(),
        "read remote rows"
    );
    Ok(parsed)
}

/// Replaces the profile's remote tab with `rows`.
pub fn write_rows<R: RemoteTable + ?Sized>(
    remote: &R,
    profile: &SyncProfile,
    rows: &[SyncRow],
) -> SyncResult<WriteResult> {
    let matrix = build_matrix(profile, rows);

    remote.clear_values(&profile.remote_table_id, &profile.remote_tab_name)?;
    let cells_written =
        remote.write_values(&profile.remote_table_id, &profile.remote_tab_name, &matrix)?;

    tracing::debug!(
        table = %profile.remote_table_id,
        tab = %profile.remote_tab_name,
        rows = rows.len(),
        cells = cells_written,
        "wrote remote rows"
    );

    let header = matrix.into_iter().next().unwrap_or_default();
    Ok(WriteResult {
        header,
        rows_written: rows.len(),
        cells_written,
    })
}

fn push_unique(header: &mut Vec<String>, name: &str) {
    if !header.iter().any(|h| h.eq_ignore_ascii_case(name)) {
        header.push(name.to_string());
    }
}

fn column_index(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryRemoteTable;
    use schedsync_core::{ColumnMapping, RowState};

    fn profile() -> SyncProfile {
        SyncProfile::new("t", "Doors", "SyncId")
            .with_mapping(ColumnMapping::new("Mark", "Mark"))
            .with_mapping(ColumnMapping::new("Width", "Width"))
    }

    fn matrix(rows: &[&[&str]]) -> ValueMatrix {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn duplicates_are_flagged_after_first_occurrence() {
        let m = matrix(&[
            &["syncid", "Mark"],
            &["a", "D1"],
            &["b", "D2"],
            &["a", "D3"],
            &["a", "D4"],
        ]);
        let parsed = parse_rows(&profile(), &m, true);
        let states: Vec<_> = parsed.rows.iter().map(|r| r.state()).collect();
        assert_eq!(
            states,
            vec![RowState::Unchanged, RowState::Unchanged, RowState::Error, RowState::Error]
        );
        assert!(parsed.rows[2].has_error(RowErrorCode::AnchorDuplicate));
        assert!(parsed.rows[2].errors()[0].message.contains("row 2"));
    }

    #[test]
    fn blank_anchor_is_missing() {
        let m = matrix(&[&["SyncId", "Mark"], &["  ", "D1"], &["c"]]);
        let parsed = parse_rows(&profile(), &m, true);
        assert!(parsed.rows[0].has_error(RowErrorCode::AnchorMissing));
        // Short rows are padded.
        assert_eq!(parsed.rows[1].cells.get("Mark"), Some(""));
    }

    #[test]
    fn missing_anchor_column_flags_every_row() {
        let m = matrix(&[&["Mark"], &["D1"], &["D2"]]);
        let parsed = parse_rows(&profile(), &m, true);
        assert!(parsed
            .rows
            .iter()
            .all(|r| r.has_error(RowErrorCode::AnchorMissing)));
    }

    #[test]
    fn blank_rows_are_optional() {
        let m = matrix(&[&["SyncId", "Mark"], &["", ""], &["a", "D1"]]);
        assert_eq!(parse_rows(&profile(), &m, true).rows.len(), 1);
        assert_eq!(parse_rows(&profile(), &m, false).rows.len(), 2);
    }

    #[test]
    fn element_id_column_is_parsed() {
        let m = matrix(&[&["SyncId", "ElementId"], &["a", "1001"], &["b", "x"]]);
        let parsed = parse_rows(&profile(), &m, true);
        assert_eq!(parsed.rows[0].element_ref, Some(ElementRef(1001)));
        assert_eq!(parsed.rows[1].element_ref, None);
    }

    #[test]
    fn empty_matrix_has_no_rows() {
        assert_eq!(parse_rows(&profile(), &[], true), RemoteRows::default());
    }

    #[test]
    fn header_is_union_in_order() {
        let row = SyncRow::new("a")
            .with_element_ref(ElementRef(7))
            .with_cell("Level", "L1")
            .with_cell("mark", "D1")
            .with_cell("SyncId", "stale")
            .with_cell("ElementId", "999");
        let m = build_matrix(&profile(), &[row]);
        assert_eq!(m[0], vec!["SyncId", "ElementId", "Mark", "Width", "Level"]);
        assert_eq!(m[1], vec!["a", "7", "D1", "", "L1"]);
    }

    #[test]
    fn write_rows_replaces_tab() {
        let remote = MemoryRemoteTable::new();
        remote.set_values("t", "Doors", matrix(&[&["Old"], &["x"], &["y"]]));

        let rows = vec![SyncRow::new("a").with_cell("Mark", "D1")];
        let result = write_rows(&remote, &profile(), &rows).unwrap();
        assert_eq!(result.rows_written, 1);
        assert_eq!(result.cells_written, 8);
        assert_eq!(result.header, vec!["SyncId", "ElementId", "Mark", "Width"]);

        let read = read_rows(&remote, &profile(), true).unwrap();
        assert_eq!(read.rows.len(), 1);
        assert_eq!(read.rows[0].anchor, "a");
        assert_eq!(read.rows[0].cells.get("Mark"), Some("D1"));
    }
}
