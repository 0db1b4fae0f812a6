//! Import command implementation.

use super::{load_json, save_json, SyncPaths};
use schedsync_core::{MemoryDocument, RowState, SyncProfile};
use schedsync_sync_engine::{FileRemoteTable, ImportReport, ScheduleSync, SyncConfig};

/// Runs the import command.
pub fn run(paths: &SyncPaths, apply: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let report = execute(paths, apply)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => print_text_output(&report),
    }

    Ok(())
}

/// Diffs the remote file against the document file. With `apply`, the
/// changes are applied and the document file is rewritten.
pub fn execute(paths: &SyncPaths, apply: bool) -> Result<ImportReport, Box<dyn std::error::Error>> {
    let mut doc: MemoryDocument = load_json(&paths.document)?;
    let mut profile: SyncProfile = load_json(&paths.profile)?;

    let sync = ScheduleSync::new(SyncConfig::new(), FileRemoteTable::open(&paths.remote));
    let report = sync.import_schedule(&mut doc, &mut profile, apply)?;

    if report.apply.is_some() {
        save_json(&paths.document, &doc)?;
        tracing::info!(path = %paths.document.display(), "document saved");
    }
    Ok(report)
}

fn print_text_output(report: &ImportReport) {
    let diff = &report.diff;
    println!("Import Preview");
    println!("==============");
    println!();
    println!("  Changed:   {}", diff.changed_count);
    println!("  Unchanged: {}", diff.unchanged_count);
    println!("  Errors:    {}", diff.error_count);

    if diff.changed_count > 0 {
        println!();
        println!("Changes:");
        for row in diff.rows_in(RowState::Modified) {
            for change in row.changes() {
                println!(
                    "  [{}] {}: '{}' -> '{}'",
                    row.anchor, change.column, change.current, change.incoming
                );
            }
        }
    }

    if diff.error_count > 0 {
        println!();
        println!("Errors:");
        for row in diff.rows_in(RowState::Error) {
            for error in row.errors() {
                println!("  [{}] {}", row.anchor, error);
            }
        }
    }

    match &report.apply {
        Some(applied) => {
            println!();
            println!("Applied:");
            println!("  Rows applied: {}", applied.applied_count);
            println!("  Rows failed:  {}", applied.failed_count);
            println!("  Rows skipped: {}", applied.skipped_count);
            for error in &applied.errors {
                println!("  [{}] {}", error.anchor, error.message);
            }
        }
        None if diff.changed_count > 0 => {
            println!();
            println!("Run again with --apply to write these changes.");
        }
        None => {}
    }
}
