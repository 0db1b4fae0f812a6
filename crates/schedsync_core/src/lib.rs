//! # schedsync core
//!
//! Reconciliation and apply engine for keeping a schedule grid in a live
//! authoring document in step with a copy held in a remote table.
//!
//! This crate provides:
//! - Row and profile model ([`SyncRow`], [`SyncProfile`])
//! - The [`Document`] collaborator trait and an in-memory implementation
//! - Type-aware field access ([`FieldAccessor`])
//! - Grid extraction with header deduplication ([`GridExtractor`])
//! - Non-mutating diffing ([`DiffEngine`])
//! - Transactional, partially-successful apply ([`ApplyEngine`])
//!
//! ## Key Invariants
//!
//! - Rows are matched by anchor, never by position or element handle
//! - Protected, anchor and element id columns are never editable
//! - Diffing never mutates the document
//! - One transaction per apply; row failures are reported, not raised

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod apply;
mod diff;
mod document;
mod error;
mod extract;
mod field;
mod memory;
mod profile;
mod row;
mod value;

pub use apply::{ApplyEngine, APPLY_TRANSACTION_NAME};
pub use diff::DiffEngine;
pub use document::{Document, ElementRef, FieldScope, FieldSlot, GridSection, GridShape};
pub use error::{CoreError, CoreResult, RowError, RowErrorCode};
pub use extract::{dedup_headers, resolve_anchor, ExtractedGrid, GridExtractor};
pub use field::FieldAccessor;
pub use memory::{MemoryDocument, MemoryElement, MemoryField, MemorySchedule, ScheduleColumn};
pub use profile::{ColumnMapping, SyncProfile, ELEMENT_ID_COLUMN};
pub use row::{ApplyError, ApplyResult, CellMap, DiffResult, FieldChange, RowState, SyncRow};
pub use value::{format_real, FieldValue, StorageKind};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
