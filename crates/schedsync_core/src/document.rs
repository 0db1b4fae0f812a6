//! The live authoring document as seen by the engine.
//!
//! The engine never touches a document directly; it goes through the
//! [`Document`] trait. Access is assumed to be serialized by the host, so
//! the trait takes `&mut self` for every mutation and offers no locking.

use crate::error::CoreResult;
use crate::value::{FieldValue, StorageKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ephemeral numeric handle to a document element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementRef(pub i64);

impl ElementRef {
    /// Returns the raw handle.
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Section of a schedule grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridSection {
    /// Title and column header rows.
    Header,
    /// Data rows.
    Body,
}

/// Dimensions of a schedule grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridShape {
    /// Number of columns.
    pub columns: usize,
    /// Rows in the header section. Labels come from the last one.
    pub header_rows: usize,
    /// Rows in the body section.
    pub body_rows: usize,
}

/// Where a field lives on an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldScope {
    /// On the element itself.
    Instance,
    /// On the element's type, shared by all its instances.
    Type,
}

/// Snapshot of one field as the document reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSlot {
    /// Storage kind.
    pub kind: StorageKind,
    /// Whether the document refuses writes.
    pub read_only: bool,
    /// Current value.
    pub value: FieldValue,
}

/// Operations the engine needs from a live document.
pub trait Document {
    /// Names of all schedule grids, in document order.
    fn schedule_names(&self) -> Vec<String>;

    /// Dimensions of a schedule grid.
    fn grid_shape(&self, schedule: &str) -> CoreResult<GridShape>;

    /// Display text of one cell.
    fn cell_text(
        &self,
        schedule: &str,
        section: GridSection,
        row: usize,
        col: usize,
    ) -> CoreResult<String>;

    /// The element a body row was generated from, if it can be traced.
    fn row_element(&self, schedule: &str, row: usize) -> Option<ElementRef>;

    /// Resolves a stable anchor to a live element.
    fn element_by_anchor(&self, anchor: &str) -> Option<ElementRef>;

    /// Returns true if the handle still refers to a live element.
    fn element_exists(&self, element: ElementRef) -> bool;

    /// The element's own stable identity.
    fn element_anchor(&self, element: ElementRef) -> Option<String>;

    /// Looks up a field at the given scope.
    fn field(&self, element: ElementRef, scope: FieldScope, name: &str) -> Option<FieldSlot>;

    /// Stores a value. Only valid inside a transaction.
    fn set_field(
        &mut self,
        element: ElementRef,
        scope: FieldScope,
        name: &str,
        value: FieldValue,
    ) -> CoreResult<()>;

    /// Opens the document-wide transaction.
    fn begin_transaction(&mut self, name: &str) -> CoreResult<()>;

    /// Commits the open transaction.
    fn commit_transaction(&mut self) -> CoreResult<()>;

    /// Discards the open transaction.
    fn rollback_transaction(&mut self) -> CoreResult<()>;
}
