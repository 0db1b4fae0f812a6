//! # schedsync Sync Engine
//!
//! Remote side and orchestration for schedsync.
//!
//! This crate provides:
//! - The [`RemoteTable`] transport abstraction with in-memory and
//!   JSON-file implementations
//! - Row-level remote reads and writes with duplicate-anchor detection
//! - Export (document → remote) and import (remote → diff → apply)
//! - Retry with exponential backoff and cooperative cancellation
//!
//! ## Architecture
//!
//! Data flows one way per run:
//! 1. Export extracts the schedule grid and replaces the remote tab
//! 2. Import reads the remote tab and diffs it against the document
//! 3. Apply writes Modified rows inside one document transaction
//!
//! Import without apply is a preview: it never touches the document and
//! can be repeated; the caller confirms with a separate apply call.
//!
//! ## Key Invariants
//!
//! - Remote writes always clear the tab first
//! - A fatal error on export happens before any remote write
//! - Cancellation is never observed inside the apply transaction
//! - Incoming remote data overwrites document values (last write wins)

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod config;
mod engine;
mod error;
mod file_remote;
mod remote;

pub use adapter::{build_matrix, parse_rows, read_rows, write_rows, RemoteRows, WriteResult};
pub use config::{RetryConfig, SyncConfig};
pub use engine::{ExportReport, ImportReport, ScheduleSync, SyncState, SyncStats};
pub use error::{SyncError, SyncResult};
pub use file_remote::FileRemoteTable;
pub use remote::{MemoryRemoteTable, RemoteTable, ValueMatrix};
