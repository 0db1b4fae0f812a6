//! Export and import orchestration.

use crate::adapter::{self, WriteResult};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteTable;
use parking_lot::RwLock;
use schedsync_core::{
    ApplyEngine, ApplyResult, DiffEngine, DiffResult, Document, GridExtractor, SyncProfile,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// The current state of a [`ScheduleSync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing has run yet, or the last run was cancelled.
    Idle,
    /// Reading the schedule grid from the document.
    Extracting,
    /// Replacing the remote tab.
    Writing,
    /// Reading rows from the remote tab.
    Reading,
    /// Comparing remote rows against the document.
    Diffing,
    /// Writing changes into the document.
    Applying,
    /// The last run completed.
    Synced,
    /// The last run failed.
    Error,
}

impl SyncState {
    /// Returns true while a run is in progress.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SyncState::Extracting
                | SyncState::Writing
                | SyncState::Reading
                | SyncState::Diffing
                | SyncState::Applying
        )
    }

    /// Returns true if a new run can start.
    pub fn can_start(&self) -> bool {
        !self.is_active()
    }
}

/// Cumulative statistics across runs.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Completed exports.
    pub exports_completed: u64,
    /// Completed imports, previews included.
    pub imports_completed: u64,
    /// Completed apply transactions.
    pub applies_completed: u64,
    /// Rows written to the remote table.
    pub rows_exported: u64,
    /// Rows applied to the document.
    pub rows_applied: u64,
    /// Rows that failed to apply.
    pub rows_failed: u64,
    /// Remote calls retried after a transient failure.
    pub retries: u64,
    /// When the last run completed.
    pub last_sync_time: Option<Instant>,
    /// Message of the last fatal error.
    pub last_error: Option<String>,
}

/// Outcome of an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    /// Schedule that was exported.
    pub schedule: String,
    /// Rows written to the remote table.
    pub exported_rows: usize,
    /// Rows left out because they had no anchor.
    pub skipped_error_rows: usize,
    /// Remote write details.
    pub write: WriteResult,
}

/// Outcome of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Classified remote rows.
    pub diff: DiffResult,
    /// Apply outcome, present only when apply was requested.
    pub apply: Option<ApplyResult>,
}

/// Drives exports and imports between a document and a remote table.
///
/// One run at a time: a second call while a run is active fails with
/// [`SyncError::InvalidStateTransition`]. Cancellation is cooperative and
/// is observed before each remote call and before the apply transaction
/// begins. Once the transaction is open the run completes.
pub struct ScheduleSync<R: RemoteTable> {
    config: SyncConfig,
    remote: R,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
    cancelled: AtomicBool,
}

impl<R: RemoteTable> ScheduleSync<R> {
    /// Creates an orchestrator over `remote`.
    pub fn new(config: SyncConfig, remote: R) -> Self {
        Self {
            config,
            remote,
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
            cancelled: AtomicBool::new(false),
        }
    }

    /// The configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The remote table.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Requests cancellation. The flag stays set until [`reset_cancel`].
    ///
    /// [`reset_cancel`]: ScheduleSync::reset_cancel
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Clears a pending cancellation.
    pub fn reset_cancel(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Returns true if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Extracts a schedule and replaces the profile's remote tab with it.
    ///
    /// `schedule` defaults to the first schedule in the document. Rows
    /// without an anchor are only written when the config asks for them.
    pub fn export_schedule<D: Document + ?Sized>(
        &self,
        doc: &D,
        schedule: Option<&str>,
        profile: &mut SyncProfile,
    ) -> SyncResult<ExportReport> {
        self.begin(SyncState::Extracting)?;
        let result = self.run_export(doc, schedule, profile);
        if let Ok(report) = &result {
            let mut stats = self.stats.write();
            stats.exports_completed += 1;
            stats.rows_exported += report.exported_rows as u64;
        }
        self.finish(result)
    }

    /// Reads the remote tab and diffs it against the document, applying the
    /// result when `apply` is true.
    ///
    /// Without `apply` the document is untouched and the call can be
    /// repeated freely; pass the returned diff to [`apply_diff`] to confirm.
    ///
    /// [`apply_diff`]: ScheduleSync::apply_diff
    pub fn import_schedule<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        profile: &mut SyncProfile,
        apply: bool,
    ) -> SyncResult<ImportReport> {
        self.begin(SyncState::Reading)?;
        let result = self.run_import(doc, profile, apply);
        if let Ok(report) = &result {
            let mut stats = self.stats.write();
            stats.imports_completed += 1;
            if let Some(applied) = &report.apply {
                Self::record_apply(&mut stats, applied);
            }
        }
        self.finish(result)
    }

    /// Applies a previously previewed diff.
    pub fn apply_diff<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        profile: &mut SyncProfile,
        diff: &DiffResult,
    ) -> SyncResult<ApplyResult> {
        self.begin(SyncState::Applying)?;
        let result = Self::prepare_profile(profile)
            .and_then(|()| self.run_apply(doc, profile, diff));
        if let Ok(applied) = &result {
            Self::record_apply(&mut self.stats.write(), applied);
        }
        self.finish(result)
    }

    fn run_export<D: Document + ?Sized>(
        &self,
        doc: &D,
        schedule: Option<&str>,
        profile: &mut SyncProfile,
    ) -> SyncResult<ExportReport> {
        Self::prepare_profile(profile)?;
        let profile: &SyncProfile = profile;

        self.set_state(SyncState::Extracting);
        let grid = GridExtractor::extract(doc, schedule, profile)?;

        let total = grid.rows.len();
        let rows: Vec<_> = if self.config.include_error_rows {
            grid.rows
        } else {
            grid.rows.into_iter().filter(|r| r.errors().is_empty()).collect()
        };
        let skipped_error_rows = total - rows.len();
        if skipped_error_rows > 0 {
            tracing::warn!(
                schedule = %grid.schedule,
                skipped = skipped_error_rows,
                "rows without anchor left out of export"
            );
        }

        self.set_state(SyncState::Writing);
        let write = self.with_retry("write rows", || {
            adapter::write_rows(&self.remote, profile, &rows)
        })?;

        tracing::info!(
            schedule = %grid.schedule,
            rows = rows.len(),
            table = %profile.remote_table_id,
            tab = %profile.remote_tab_name,
            "export complete"
        );

        Ok(ExportReport {
            schedule: grid.schedule,
            exported_rows: rows.len(),
            skipped_error_rows,
            write,
        })
    }

    fn run_import<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        profile: &mut SyncProfile,
        apply: bool,
    ) -> SyncResult<ImportReport> {
        Self::prepare_profile(profile)?;
        let profile: &SyncProfile = profile;

        self.set_state(SyncState::Reading);
        let remote_rows = self.with_retry("read rows", || {
            adapter::read_rows(&self.remote, profile, self.config.skip_blank_rows)
        })?;

        self.set_state(SyncState::Diffing);
        let diff = DiffEngine::diff(&*doc, &remote_rows.rows, profile);

        let apply = if apply {
            Some(self.run_apply(doc, profile, &diff)?)
        } else {
            None
        };

        Ok(ImportReport { diff, apply })
    }

    fn run_apply<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        profile: &SyncProfile,
        diff: &DiffResult,
    ) -> SyncResult<ApplyResult> {
        self.check_cancelled()?;
        self.set_state(SyncState::Applying);
        let result = ApplyEngine::apply(doc, diff, profile)?;
        if result.failed_count > 0 {
            tracing::warn!(
                applied = result.applied_count,
                failed = result.failed_count,
                "apply finished with failed rows"
            );
        }
        Ok(result)
    }

    /// Runs a remote call, retrying transient failures.
    fn with_retry<T, F>(&self, operation: &str, mut call: F) -> SyncResult<T>
    where
        F: FnMut() -> SyncResult<T>,
    {
        let retry = &self.config.retry;
        let max_attempts = retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                std::thread::sleep(retry.delay_for_attempt(attempt));
                self.stats.write().retries += 1;
            }
            self.check_cancelled()?;

            match call() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                    tracing::warn!(operation, attempt, error = %e, "remote call failed, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn prepare_profile(profile: &mut SyncProfile) -> SyncResult<()> {
        profile.validate()?;
        profile.enforce_protected_columns();
        Ok(())
    }

    fn record_apply(stats: &mut SyncStats, applied: &ApplyResult) {
        stats.applies_completed += 1;
        stats.rows_applied += applied.applied_count as u64;
        stats.rows_failed += applied.failed_count as u64;
    }

    /// Claims the engine for a run by moving straight into its first stage
    /// under the same lock that checked the current state.
    fn begin(&self, first: SyncState) -> SyncResult<()> {
        let mut state = self.state.write();
        if !state.can_start() {
            return Err(SyncError::InvalidStateTransition {
                from: format!("{:?}", *state),
                to: format!("{:?}", first),
            });
        }
        *state = first;
        Ok(())
    }

    fn finish<T>(&self, result: SyncResult<T>) -> SyncResult<T> {
        match &result {
            Ok(_) => {
                self.set_state(SyncState::Synced);
                let mut stats = self.stats.write();
                stats.last_sync_time = Some(Instant::now());
                stats.last_error = None;
            }
            Err(SyncError::Cancelled) => {
                tracing::info!("sync cancelled");
                self.set_state(SyncState::Idle);
            }
            Err(e) => {
                tracing::error!(error = %e, "sync failed");
                self.set_state(SyncState::Error);
                self.stats.write().last_error = Some(e.to_string());
            }
        }
        result
    }

    fn check_cancelled(&self) -> SyncResult<()> {
        if self.is_cancelled() {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn set_state(&self, state: SyncState) {
        *self.state.write() = state;
    }
}
