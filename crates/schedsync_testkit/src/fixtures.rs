//! Sample documents, profiles and row helpers.
//!
//! The door schedule has three doors sharing one door type. `Width` lives on
//! the type, `Level` is read-only, and every other column is an instance
//! field.

use schedsync_core::{
    ColumnMapping, ElementRef, FieldValue, MemoryDocument, StorageKind, SyncProfile, SyncRow,
};

/// Name of the sample schedule.
pub const DOOR_SCHEDULE: &str = "Door Schedule";

/// Remote table id used by [`door_profile`].
pub const DOOR_TABLE_ID: &str = "doors-table";

/// Remote tab name used by [`door_profile`].
pub const DOOR_TAB_NAME: &str = "Doors";

/// Anchor column used by [`door_profile`].
pub const DOOR_ANCHOR_COLUMN: &str = "SyncId";

/// Stable identities of the sample doors, in schedule order.
pub const DOOR_ANCHORS: [&str; 3] = ["door-001", "door-002", "door-003"];

/// A document holding the sample door schedule.
#[derive(Debug, Clone)]
pub struct DoorSchedule {
    /// The document.
    pub doc: MemoryDocument,
    /// Door elements, in schedule order.
    pub doors: Vec<ElementRef>,
    /// The shared door type.
    pub door_type: ElementRef,
}

impl DoorSchedule {
    /// Builds the sample document.
    pub fn new() -> Self {
        let mut doc = MemoryDocument::new();

        let door_type = doc.add_element("door-type-900");
        doc.set_initial(door_type, "Width", StorageKind::Real, FieldValue::Real(0.9));

        let marks = ["D101", "D102", "D103"];
        let ratings = ["30 min", "", "60 min"];
        let mut doors = Vec::with_capacity(DOOR_ANCHORS.len());
        for (i, anchor) in DOOR_ANCHORS.iter().enumerate() {
            let door = doc.add_element(*anchor);
            doc.set_type(door, door_type);
            doc.set_initial(door, "Mark", StorageKind::Text, FieldValue::Text(marks[i].into()));
            doc.set_initial(door, "Height", StorageKind::Real, FieldValue::Real(2.1));
            doc.set_initial(
                door,
                "Fire Rating",
                StorageKind::Text,
                FieldValue::Text(ratings[i].into()),
            );
            doc.set_initial(door, "Leaf Count", StorageKind::Integer, FieldValue::Integer(1));
            doc.set_initial_read_only(
                door,
                "Level",
                StorageKind::Text,
                FieldValue::Text("Level 1".into()),
            );
            doors.push(door);
        }

        doc.add_schedule(
            DOOR_SCHEDULE,
            vec![
                ("Mark", "Mark"),
                ("Level", "Level"),
                ("Width", "Width"),
                ("Height", "Height"),
                ("Fire Rating", "Fire Rating"),
                ("Leaf Count", "Leaf Count"),
            ],
        );
        doc.set_schedule_title(DOOR_SCHEDULE, "Door Schedule");
        for door in &doors {
            doc.add_schedule_row(DOOR_SCHEDULE, Some(*door));
        }

        Self {
            doc,
            doors,
            door_type,
        }
    }

    /// Adds a schedule row that points at no element.
    pub fn with_orphan_row(mut self) -> Self {
        self.doc.add_schedule_row(DOOR_SCHEDULE, None);
        self
    }
}

impl Default for DoorSchedule {
    fn default() -> Self {
        Self::new()
    }
}

/// A profile mapping every door column. `Mark` is protected and `Level` is
/// mapped read-only.
pub fn door_profile() -> SyncProfile {
    SyncProfile::new(DOOR_TABLE_ID, DOOR_TAB_NAME, DOOR_ANCHOR_COLUMN)
        .with_mapping(ColumnMapping::new("Mark", "Mark"))
        .with_mapping(ColumnMapping::read_only("Level", "Level"))
        .with_mapping(ColumnMapping::new("Width", "Width"))
        .with_mapping(ColumnMapping::new("Height", "Height"))
        .with_mapping(ColumnMapping::new("Fire Rating", "Fire Rating"))
        .with_mapping(ColumnMapping::new("Leaf Count", "Leaf Count"))
        .with_protected_column("Mark")
}

/// Builds a value matrix from string slices.
pub fn matrix(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| r.iter().map(|c| (*c).to_string()).collect())
        .collect()
}

/// Builds an incoming row from `(column, value)` pairs.
pub fn incoming_row(anchor: &str, cells: &[(&str, &str)]) -> SyncRow {
    cells
        .iter()
        .fold(SyncRow::new(anchor), |row, (column, value)| {
            row.with_cell(*column, *value)
        })
}
