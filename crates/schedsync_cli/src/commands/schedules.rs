//! Schedules command implementation.

use super::load_json;
use schedsync_core::{Document, MemoryDocument};
use serde::Serialize;
use std::path::Path;

/// One schedule in a document.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ScheduleInfo {
    /// Schedule name.
    pub name: String,
    /// Number of grid columns.
    pub columns: usize,
    /// Number of body rows.
    pub rows: usize,
}

/// Runs the schedules command.
pub fn run(document: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let doc: MemoryDocument = load_json(document)?;
    let schedules = list(&doc)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&schedules)?);
        }
        _ => {
            if schedules.is_empty() {
                println!("No schedules in {}", document.display());
            }
            for s in &schedules {
                println!("{}  ({} columns, {} rows)", s.name, s.columns, s.rows);
            }
        }
    }

    Ok(())
}

/// Lists every schedule with its grid size.
pub fn list<D: Document>(doc: &D) -> Result<Vec<ScheduleInfo>, schedsync_core::CoreError> {
    doc.schedule_names()
        .into_iter()
        .map(|name| {
            let shape = doc.grid_shape(&name)?;
            Ok(ScheduleInfo {
                name,
                columns: shape.columns,
                rows: shape.body_rows,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use schedsync_testkit::{DoorSchedule, DOOR_SCHEDULE};

    #[test]
    fn lists_door_schedule() {
        let fixture = DoorSchedule::new().with_orphan_row();
        let schedules = list(&fixture.doc).unwrap();
        assert_eq!(
            schedules,
            vec![ScheduleInfo {
                name: DOOR_SCHEDULE.to_string(),
                columns: 6,
                rows: 4,
            }]
        );
    }
}
