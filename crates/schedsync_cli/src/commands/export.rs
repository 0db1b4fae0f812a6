//! Export command implementation.

use super::{load_json, SyncPaths};
use schedsync_core::{MemoryDocument, SyncProfile};
use schedsync_sync_engine::{ExportReport, FileRemoteTable, ScheduleSync, SyncConfig};

/// Runs the export command.
pub fn run(
    paths: &SyncPaths,
    schedule: Option<&str>,
    include_errors: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = execute(paths, schedule, include_errors)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!("Exported schedule '{}'", report.schedule);
            println!("  Rows written:     {}", report.exported_rows);
            println!("  Rows skipped:     {}", report.skipped_error_rows);
            println!("  Columns:          {}", report.write.header.join(", "));
            println!("  Cells written:    {}", report.write.cells_written);
        }
    }

    Ok(())
}

/// Exports a schedule from the document file to the remote file.
pub fn execute(
    paths: &SyncPaths,
    schedule: Option<&str>,
    include_errors: bool,
) -> Result<ExportReport, Box<dyn std::error::Error>> {
    let doc: MemoryDocument = load_json(&paths.document)?;
    let mut profile: SyncProfile = load_json(&paths.profile)?;

    let config = SyncConfig::new().with_error_rows(include_errors);
    let sync = ScheduleSync::new(config, FileRemoteTable::open(&paths.remote));
    Ok(sync.export_schedule(&doc, schedule, &mut profile)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::save_json;
    use schedsync_sync_engine::RemoteTable;
    use schedsync_testkit::{door_profile, DoorSchedule, DOOR_TABLE_ID, DOOR_TAB_NAME};
    use tempfile::TempDir;

    #[test]
    fn export_writes_remote_file() {
        let dir = TempDir::new().unwrap();
        let paths = SyncPaths::new(
            dir.path().join("doc.json"),
            dir.path().join("profile.json"),
            dir.path().join("remote.json"),
        );
        save_json(&paths.document, &DoorSchedule::new().with_orphan_row().doc).unwrap();
        save_json(&paths.profile, &door_profile()).unwrap();

        let report = execute(&paths, None, false).unwrap();
        assert_eq!(report.exported_rows, 3);
        assert_eq!(report.skipped_error_rows, 1);

        let remote = FileRemoteTable::open(&paths.remote);
        let values = remote.read_values(DOOR_TABLE_ID, DOOR_TAB_NAME).unwrap();
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn unknown_schedule_fails() {
        let dir = TempDir::new().unwrap();
        let paths = SyncPaths::new(
            dir.path().join("doc.json"),
            dir.path().join("profile.json"),
            dir.path().join("remote.json"),
        );
        save_json(&paths.document, &DoorSchedule::new().doc).unwrap();
        save_json(&paths.profile, &door_profile()).unwrap();

        let err = execute(&paths, Some("Window Schedule"), false).unwrap_err();
        assert!(err.to_string().contains("Window Schedule"));
        assert!(!paths.remote.exists());
    }
}
