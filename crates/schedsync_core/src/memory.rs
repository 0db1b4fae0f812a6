//! In-memory document.
//!
//! A complete [`Document`] implementation with schedules, instance and type
//! fields, and snapshot transactions. The CLI loads it from JSON; tests use
//! its fault-injection hooks to exercise failure paths.

use crate::document::{Document, ElementRef, FieldScope, FieldSlot, GridSection, GridShape};
use crate::error::{CoreError, CoreResult};
use crate::field::FieldAccessor;
use crate::value::{FieldValue, StorageKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A stored field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryField {
    /// Storage kind.
    pub kind: StorageKind,
    /// Current value.
    pub value: FieldValue,
    /// Whether writes are refused.
    #[serde(default)]
    pub read_only: bool,
}

/// A stored element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryElement {
    /// Stable identity.
    pub unique_id: String,
    /// Type element, if any.
    #[serde(default)]
    pub type_id: Option<ElementRef>,
    /// Fields by name.
    #[serde(default)]
    pub fields: BTreeMap<String, MemoryField>,
}

/// One schedule column bound to an element field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleColumn {
    /// Header label.
    pub label: String,
    /// Field shown in the column.
    pub field: String,
}

/// A schedule grid over a list of rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySchedule {
    /// Schedule name.
    pub name: String,
    /// Optional title row above the column headers.
    #[serde(default)]
    pub title: Option<String>,
    /// Columns.
    pub columns: Vec<ScheduleColumn>,
    /// Body rows; `None` for rows with no element behind them.
    #[serde(default)]
    pub rows: Vec<Option<ElementRef>>,
}

impl MemorySchedule {
    fn header_rows(&self) -> usize {
        if self.title.is_some() {
            2
        } else {
            1
        }
    }
}

fn first_element_id() -> i64 {
    1000
}

/// An in-memory [`Document`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDocument {
    #[serde(default)]
    elements: BTreeMap<i64, MemoryElement>,
    #[serde(default)]
    schedules: Vec<MemorySchedule>,
    #[serde(default = "first_element_id")]
    next_id: i64,
    #[serde(skip)]
    snapshot: Option<BTreeMap<i64, MemoryElement>>,
    #[serde(skip)]
    failing_fields: BTreeSet<String>,
    #[serde(skip)]
    fail_commit: bool,
}

impl MemoryDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self {
            next_id: first_element_id(),
            ..Self::default()
        }
    }

    /// Adds an element with the given stable identity.
    pub fn add_element(&mut self, unique_id: impl Into<String>) -> ElementRef {
        if self.next_id < first_element_id() {
            self.next_id = first_element_id();
        }
        let id = self.next_id;
        self.next_id += 1;
        self.elements.insert(
            id,
            MemoryElement {
                unique_id: unique_id.into(),
                type_id: None,
                fields: BTreeMap::new(),
            },
        );
        ElementRef(id)
    }

    /// Adds an element with a freshly generated identity.
    pub fn add_element_with_generated_id(&mut self) -> ElementRef {
        self.add_element(uuid::Uuid::new_v4().to_string())
    }

    /// Removes an element. Schedule rows pointing at it stay in place.
    pub fn remove_element(&mut self, element: ElementRef) -> bool {
        self.elements.remove(&element.0).is_some()
    }

    /// Assigns a type element.
    pub fn set_type(&mut self, element: ElementRef, type_element: ElementRef) {
        if let Some(e) = self.elements.get_mut(&element.0) {
            e.type_id = Some(type_element);
        }
    }

    /// Defines a writable field, bypassing transactions.
    pub fn set_initial(
        &mut self,
        element: ElementRef,
        name: impl Into<String>,
        kind: StorageKind,
        value: FieldValue,
    ) {
        self.define_field(element, name.into(), kind, value, false);
    }

    /// Defines a read-only field, bypassing transactions.
    pub fn set_initial_read_only(
        &mut self,
        element: ElementRef,
        name: impl Into<String>,
        kind: StorageKind,
        value: FieldValue,
    ) {
        self.define_field(element, name.into(), kind, value, true);
    }

    fn define_field(
        &mut self,
        element: ElementRef,
        name: String,
        kind: StorageKind,
        value: FieldValue,
        read_only: bool,
    ) {
        if let Some(e) = self.elements.get_mut(&element.0) {
            e.fields.insert(
                name,
                MemoryField {
                    kind,
                    value,
                    read_only,
                },
            );
        }
    }

    /// Adds a schedule with `(label, field)` columns and no rows.
    pub fn add_schedule<L, F>(&mut self, name: impl Into<String>, columns: Vec<(L, F)>)
    where
        L: Into<String>,
        F: Into<String>,
    {
        self.schedules.push(MemorySchedule {
            name: name.into(),
            title: None,
            columns: columns
                .into_iter()
                .map(|(label, field)| ScheduleColumn {
                    label: label.into(),
                    field: field.into(),
                })
                .collect(),
            rows: Vec::new(),
        });
    }

    /// Sets a schedule's title row.
    pub fn set_schedule_title(&mut self, schedule: &str, title: impl Into<String>) {
        if let Some(s) = self.schedule_mut(schedule) {
            s.title = Some(title.into());
        }
    }

    /// Appends a body row to a schedule.
    pub fn add_schedule_row(&mut self, schedule: &str, element: Option<ElementRef>) {
        if let Some(s) = self.schedule_mut(schedule) {
            s.rows.push(element);
        }
    }

    /// Makes every write to a field with this name fail.
    pub fn fail_writes_to(&mut self, field: impl Into<String>) {
        self.failing_fields.insert(field.into());
    }

    /// Makes the next commit fail and discard the transaction.
    pub fn fail_next_commit(&mut self) {
        self.fail_commit = true;
    }

    /// Returns true while a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Number of live elements.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    fn schedule(&self, name: &str) -> CoreResult<&MemorySchedule> {
        self.schedules
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| CoreError::schedule_not_found(name))
    }

    fn schedule_mut(&mut self, name: &str) -> Option<&mut MemorySchedule> {
        self.schedules.iter_mut().find(|s| s.name == name)
    }

    fn owner_of(&self, element: ElementRef, scope: FieldScope) -> Option<i64> {
        match scope {
            FieldScope::Instance => self.elements.contains_key(&element.0).then_some(element.0),
            FieldScope::Type => self
                .elements
                .get(&element.0)
                .and_then(|e| e.type_id)
                .map(|t| t.0),
        }
    }
}

impl Document for MemoryDocument {
    fn schedule_names(&self) -> Vec<String> {
        self.schedules.iter().map(|s| s.name.clone()).collect()
    }

    fn grid_shape(&self, schedule: &str) -> CoreResult<GridShape> {
        let s = self.schedule(schedule)?;
        Ok(GridShape {
            columns: s.columns.len(),
            header_rows: s.header_rows(),
            body_rows: s.rows.len(),
        })
    }

    fn cell_text(
        &self,
        schedule: &str,
        section: GridSection,
        row: usize,
        col: usize,
    ) -> CoreResult<String> {
        let s = self.schedule(schedule)?;
        let out_of_range = || CoreError::CellOutOfRange {
            schedule: schedule.to_string(),
            section,
            row,
            col,
        };
        let column = s.columns.get(col).ok_or_else(out_of_range)?;

        match section {
            GridSection::Header => {
                if row >= s.header_rows() {
                    return Err(out_of_range());
                }
                let is_label_row = row + 1 == s.header_rows();
                Ok(match (&s.title, is_label_row) {
                    (_, true) => column.label.clone(),
                    (Some(title), false) if col == 0 => title.clone(),
                    _ => String::new(),
                })
            }
            GridSection::Body => {
                let element = s.rows.get(row).ok_or_else(out_of_range)?;
                Ok((*element)
                    .and_then(|e| FieldAccessor::read(self, e, &column.field))
                    .unwrap_or_default())
            }
        }
    }

    fn row_element(&self, schedule: &str, row: usize) -> Option<ElementRef> {
        let element = self.schedule(schedule).ok()?.rows.get(row).copied().flatten()?;
        self.element_exists(element).then_some(element)
    }

    fn element_by_anchor(&self, anchor: &str) -> Option<ElementRef> {
        self.elements
            .iter()
            .find(|(_, e)| e.unique_id == anchor)
            .map(|(id, _)| ElementRef(*id))
    }

    fn element_exists(&self, element: ElementRef) -> bool {
        self.elements.contains_key(&element.0)
    }

    fn element_anchor(&self, element: ElementRef) -> Option<String> {
        self.elements.get(&element.0).map(|e| e.unique_id.clone())
    }

    fn field(&self, element: ElementRef, scope: FieldScope, name: &str) -> Option<FieldSlot> {
        let owner = self.owner_of(element, scope)?;
        self.elements
            .get(&owner)?
            .fields
            .get(name)
            .map(|f| FieldSlot {
                kind: f.kind,
                read_only: f.read_only,
                value: f.value.clone(),
            })
    }

    fn set_field(
        &mut self,
        element: ElementRef,
        scope: FieldScope,
        name: &str,
        value: FieldValue,
    ) -> CoreResult<()> {
        if self.snapshot.is_none() {
            return Err(CoreError::invalid_operation(
                "document modification outside of a transaction",
            ));
        }
        if self.failing_fields.contains(name) {
            return Err(CoreError::field_write(format!(
                "document refused to modify {}",
                name
            )));
        }

        let owner = self
            .owner_of(element, scope)
            .ok_or_else(|| CoreError::field_write(format!("no {:?} owner for {}", scope, element)))?;
        let field = self
            .elements
            .get_mut(&owner)
            .and_then(|e| e.fields.get_mut(name))
            .ok_or_else(|| CoreError::field_write(format!("{} does not exist", name)))?;

        if field.read_only {
            return Err(CoreError::field_write(format!("{} is read-only", name)));
        }
        if !field.kind.accepts(&value) {
            return Err(CoreError::field_write(format!(
                "{} stores {}, got {:?}",
                name, field.kind, value
            )));
        }
        field.value = value;
        Ok(())
    }

    fn begin_transaction(&mut self, name: &str) -> CoreResult<()> {
        if self.snapshot.is_some() {
            return Err(CoreError::transaction_start(format!(
                "cannot start '{}': a transaction is already open",
                name
            )));
        }
        self.snapshot = Some(self.elements.clone());
        Ok(())
    }

    fn commit_transaction(&mut self) -> CoreResult<()> {
        let snapshot = self
            .snapshot
            .take()
            .ok_or_else(|| CoreError::invalid_operation("no open transaction"))?;
        if self.fail_commit {
            self.fail_commit = false;
            self.elements = snapshot;
            return Err(CoreError::transaction_commit("document rejected the commit"));
        }
        Ok(())
    }

    fn rollback_transaction(&mut self) -> CoreResult<()> {
        let snapshot = self
            .snapshot
            .take()
            .ok_or_else(|| CoreError::invalid_operation("no open transaction"))?;
        self.elements = snapshot;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> (MemoryDocument, ElementRef) {
        let mut doc = MemoryDocument::new();
        let wall = doc.add_element("uid-1");
        doc.set_initial(wall, "Length", StorageKind::Real, FieldValue::Real(10.0));
        doc.add_schedule("Walls", vec![("Length", "Length")]);
        doc.set_schedule_title("Walls", "Wall Schedule");
        doc.add_schedule_row("Walls", Some(wall));
        doc.add_schedule_row("Walls", None);
        (doc, wall)
    }

    #[test]
    fn grid_reads_header_and_body() {
        let (doc, _) = document();
        let shape = doc.grid_shape("Walls").unwrap();
        assert_eq!(shape, GridShape { columns: 1, header_rows: 2, body_rows: 2 });

        assert_eq!(doc.cell_text("Walls", GridSection::Header, 0, 0).unwrap(), "Wall Schedule");
        assert_eq!(doc.cell_text("Walls", GridSection::Header, 1, 0).unwrap(), "Length");
        assert_eq!(doc.cell_text("Walls", GridSection::Body, 0, 0).unwrap(), "10.0");
        assert_eq!(doc.cell_text("Walls", GridSection::Body, 1, 0).unwrap(), "");
        assert!(doc.cell_text("Walls", GridSection::Body, 2, 0).is_err());
        assert!(matches!(
            doc.grid_shape("Doors"),
            Err(CoreError::ScheduleNotFound { .. })
        ));
    }

    #[test]
    fn rollback_restores_snapshot() {
        let (mut doc, wall) = document();
        doc.begin_transaction("edit").unwrap();
        doc.set_field(wall, FieldScope::Instance, "Length", FieldValue::Real(3.0))
            .unwrap();
        doc.rollback_transaction().unwrap();
        assert_eq!(FieldAccessor::read(&doc, wall, "Length").as_deref(), Some("10.0"));
    }

    #[test]
    fn failed_commit_discards_everything() {
        let (mut doc, wall) = document();
        doc.fail_next_commit();
        doc.begin_transaction("edit").unwrap();
        doc.set_field(wall, FieldScope::Instance, "Length", FieldValue::Real(3.0))
            .unwrap();
        assert!(matches!(
            doc.commit_transaction(),
            Err(CoreError::TransactionCommit { .. })
        ));
        assert!(!doc.in_transaction());
        assert_eq!(FieldAccessor::read(&doc, wall, "Length").as_deref(), Some("10.0"));
    }

    #[test]
    fn nested_transactions_are_rejected() {
        let (mut doc, _) = document();
        doc.begin_transaction("outer").unwrap();
        assert!(matches!(
            doc.begin_transaction("inner"),
            Err(CoreError::TransactionStart { .. })
        ));
    }

    #[test]
    fn set_field_checks_kind() {
        let (mut doc, wall) = document();
        doc.begin_transaction("edit").unwrap();
        let err = doc
            .set_field(wall, FieldScope::Instance, "Length", FieldValue::Text("x".into()))
            .unwrap_err();
        assert!(matches!(err, CoreError::FieldWrite { .. }));
    }

    #[test]
    fn removed_elements_no_longer_resolve() {
        let (mut doc, wall) = document();
        assert_eq!(doc.element_by_anchor("uid-1"), Some(wall));
        assert!(doc.remove_element(wall));
        assert_eq!(doc.element_by_anchor("uid-1"), None);
        assert_eq!(doc.row_element("Walls", 0), None);
    }

    #[test]
    fn generated_ids_are_unique() {
        let mut doc = MemoryDocument::new();
        let a = doc.add_element_with_generated_id();
        let b = doc.add_element_with_generated_id();
        assert_ne!(doc.element_anchor(a), doc.element_anchor(b));
        assert_eq!(doc.element_count(), 2);
    }

    #[test]
    fn survives_json_round_trip() {
        let (doc, wall) = document();
        let json = serde_json::to_string(&doc).unwrap();
        let back: MemoryDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back.element_anchor(wall).as_deref(), Some("uid-1"));
        assert_eq!(back.schedule_names(), vec!["Walls".to_string()]);
    }
}
