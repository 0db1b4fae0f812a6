//! Remote table abstraction.

use crate::error::{SyncError, SyncResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// A cell matrix: one `Vec<String>` per row, header row first.
pub type ValueMatrix = Vec<Vec<String>>;

/// Raw access to a remote spreadsheet-like table.
///
/// This trait abstracts the transport, allowing for different
/// implementations (hosted spreadsheet API, local file, in-memory for
/// testing). Row-level semantics live in the adapter functions.
pub trait RemoteTable: Send + Sync {
    /// Reads every value in the tab. An existing but empty tab yields an
    /// empty matrix.
    fn read_values(&self, table_id: &str, tab_name: &str) -> SyncResult<ValueMatrix>;

    /// Clears every value in the tab.
    fn clear_values(&self, table_id: &str, tab_name: &str) -> SyncResult<()>;

    /// Writes `values` starting at the first cell. Returns the number of
    /// cells written.
    fn write_values(&self, table_id: &str, tab_name: &str, values: &[Vec<String>])
        -> SyncResult<usize>;
}

/// An in-memory remote table for testing.
///
/// Tabs are created on first write. Failures can be injected to exercise
/// retry and partial-write paths.
#[derive(Debug, Default)]
pub struct MemoryRemoteTable {
    tabs: Mutex<HashMap<(String, String), ValueMatrix>>,
    disconnected: AtomicBool,
    transient_failures: AtomicU32,
    fail_writes: AtomicBool,
    read_calls: AtomicU32,
    write_calls: AtomicU32,
}

impl MemoryRemoteTable {
    /// Creates an empty remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a matrix directly.
    pub fn set_values(&self, table_id: &str, tab_name: &str, values: ValueMatrix) {
        self.tabs
            .lock()
            .insert((table_id.to_string(), tab_name.to_string()), values);
    }

    /// Returns the stored matrix, if the tab exists.
    pub fn values(&self, table_id: &str, tab_name: &str) -> Option<ValueMatrix> {
        self.tabs
            .lock()
            .get(&(table_id.to_string(), tab_name.to_string()))
            .cloned()
    }

    /// Sets the connected state.
    pub fn set_connected(&self, connected: bool) {
        self.disconnected.store(!connected, Ordering::SeqCst);
    }

    /// Makes the next `count` calls fail with a retryable error.
    pub fn fail_next(&self, count: u32) {
        self.transient_failures.store(count, Ordering::SeqCst);
    }

    /// Makes every `write_values` call fail after the tab was cleared.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `read_values` calls so far.
    pub fn read_calls(&self) -> u32 {
        self.read_calls.load(Ordering::SeqCst)
    }

    /// Number of `write_values` calls so far.
    pub fn write_calls(&self) -> u32 {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> SyncResult<()> {
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(SyncError::NotConnected);
        }
        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(SyncError::transport_retryable("simulated transient failure"));
        }
        Ok(())
    }
}

impl RemoteTable for MemoryRemoteTable {
    fn read_values(&self, table_id: &str, tab_name: &str) -> SyncResult<ValueMatrix> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.values(table_id, tab_name)
            .ok_or_else(|| SyncError::TableNotFound {
                table_id: table_id.to_string(),
                tab_name: tab_name.to_string(),
            })
    }

    fn clear_values(&self, table_id: &str, tab_name: &str) -> SyncResult<()> {
        self.check_available()?;
        self.set_values(table_id, tab_name, Vec::new());
        Ok(())
    }

    fn write_values(
        &self,
        table_id: &str,
        tab_name: &str,
        values: &[Vec<String>],
    ) -> SyncResult<usize> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::transport_fatal("simulated write failure"));
        }
        self.set_values(table_id, tab_name, values.to_vec());
        Ok(values.iter().map(Vec::len).sum())
    }
}
