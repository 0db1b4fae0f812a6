//! Sync rows and per-invocation results.

use crate::document::ElementRef;
use crate::error::{RowError, RowErrorCode};
use serde::{Deserialize, Serialize};

/// Insertion-ordered map from column label to cell text.
///
/// Keys compare case-insensitively; the first spelling inserted is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMap {
    entries: Vec<(String, String)>,
}

impl CellMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, ignoring case.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|i| self.entries[i].1.as_str())
    }

    /// Returns true if `key` is present, ignoring case.
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Inserts or replaces a value. Returns the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no cells.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CellMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = CellMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Classification of a row after extraction or diffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowState {
    /// Nothing to write.
    Unchanged,
    /// At least one editable field differs and every difference is valid.
    Modified,
    /// The row cannot be applied.
    Error,
}

/// A pending change to one field, found while diffing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Sheet column carrying the incoming value.
    pub column: String,
    /// Document field that would be written.
    pub field: String,
    /// Current document text.
    pub current: String,
    /// Incoming text.
    pub incoming: String,
}

/// One logical row participating in synchronization.
///
/// The row's state is derived from its errors and recorded changes and
/// cannot be set directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRow {
    /// Stable row identity.
    pub anchor: String,
    /// Read-time element handle. Never used as identity.
    pub element_ref: Option<ElementRef>,
    /// Cell values keyed by column label.
    pub cells: CellMap,
    errors: Vec<RowError>,
    changes: Vec<FieldChange>,
}

impl SyncRow {
    /// Creates a row with the given anchor and no cells.
    pub fn new(anchor: impl Into<String>) -> Self {
        Self {
            anchor: anchor.into(),
            element_ref: None,
            cells: CellMap::new(),
            errors: Vec::new(),
            changes: Vec::new(),
        }
    }

    /// Sets the element handle.
    pub fn with_element_ref(mut self, element: ElementRef) -> Self {
        self.element_ref = Some(element);
        self
    }

    /// Adds a cell.
    pub fn with_cell(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.cells.insert(column, value);
        self
    }

    /// Current classification.
    pub fn state(&self) -> RowState {
        if !self.errors.is_empty() {
            RowState::Error
        } else if !self.changes.is_empty() {
            RowState::Modified
        } else {
            RowState::Unchanged
        }
    }

    /// Errors recorded against this row.
    pub fn errors(&self) -> &[RowError] {
        &self.errors
    }

    /// Pending field changes recorded by the diff.
    pub fn changes(&self) -> &[FieldChange] {
        &self.changes
    }

    /// Returns true if an error with `code` is recorded.
    pub fn has_error(&self, code: RowErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    /// Records an error. The row is in Error state from now on.
    pub fn push_error(&mut self, code: RowErrorCode, message: impl Into<String>) {
        self.errors.push(RowError::new(code, message));
    }

    pub(crate) fn push_change(&mut self, change: FieldChange) {
        self.changes.push(change);
    }

    pub(crate) fn clear_changes(&mut self) {
        self.changes.clear();
    }
}

/// Outcome of diffing a batch of incoming rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Classified rows, in input order.
    pub rows: Vec<SyncRow>,
    /// Rows in Modified state.
    pub changed_count: usize,
    /// Rows in Error state.
    pub error_count: usize,
    /// Rows in Unchanged state.
    pub unchanged_count: usize,
}

impl DiffResult {
    /// Builds a result and its counters from classified rows.
    pub fn from_rows(rows: Vec<SyncRow>) -> Self {
        let mut result = Self {
            rows,
            ..Self::default()
        };
        for row in &result.rows {
            match row.state() {
                RowState::Modified => result.changed_count += 1,
                RowState::Error => result.error_count += 1,
                RowState::Unchanged => result.unchanged_count += 1,
            }
        }
        result
    }

    /// Iterates over rows in the given state.
    pub fn rows_in(&self, state: RowState) -> impl Iterator<Item = &SyncRow> {
        self.rows.iter().filter(move |r| r.state() == state)
    }

    /// Returns true if there is nothing to apply.
    pub fn is_clean(&self) -> bool {
        self.changed_count == 0
    }
}

/// A row that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyError {
    /// Anchor of the failed row.
    pub anchor: String,
    /// What went wrong.
    pub message: String,
}

/// Outcome of applying a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Rows whose every changed field was written.
    pub applied_count: usize,
    /// Rows with at least one failed field.
    pub failed_count: usize,
    /// Rows not in Modified state.
    pub skipped_count: usize,
    /// One entry per failed row.
    pub errors: Vec<ApplyError>,
}
