//! Run coordination: entry points, batching, and the background driver.

use crate::error::{ErrorKind, Result};
use crate::process::{FileOutcome, FileProcessor};
use crate::run::{ProcessingRun, RunControl, RunStatus, RunToken};
use crate::sync::{SyncEngine, SyncOutcome};
use exn::ResultExt;
use futures::future::join_all;
use futures::FutureExt;
use glimpse_inventory::Repository;
use glimpse_remote::{FileKind, RemoteFileRecord};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

/// Summary returned when a run handle is awaited.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub status: RunStatus,
    pub files_processed: u64,
    pub errors: Vec<String>,
}

/// Handle to a background run. The run itself is detached; dropping the
/// handle does not cancel it, and its terminal state is recorded either way.
#[derive(Debug)]
pub struct RunHandle {
    join: JoinHandle<()>,
    control: Arc<RunControl>,
}

impl RunHandle {
    /// Wait for the run to reach a terminal state and summarize it.
    pub async fn wait(self) -> RunReport {
        // The driver records panics itself; a join error changes nothing.
        _ = self.join.await;
        let run = self.control.snapshot().await;
        RunReport { status: run.status, files_processed: run.files_processed, errors: run.errors }
    }
}

/// Orchestrates sync passes and enrichment runs.
///
/// One coordinator per application. All entry points contend for the same
/// run lock, so at most one enrichment run is active at a time.
pub struct Coordinator {
    sync: SyncEngine,
    repo: Repository,
    processor: Arc<FileProcessor>,
    control: Arc<RunControl>,
    batch_size: usize,
    /// Deadline per file, covering every collaborator call its workflow
    /// makes. Exceeding it is a per-file failure, never a run-level one.
    file_timeout: Duration,
    /// When false, sync still runs but no enrichment ever starts.
    analysis_enabled: bool,
}

impl Coordinator {
    pub fn new(
        sync: SyncEngine,
        repo: Repository,
        processor: FileProcessor,
        batch_size: usize,
        file_timeout: Duration,
        analysis_enabled: bool,
    ) -> Self {
        Self {
            sync,
            repo,
            processor: Arc::new(processor),
            control: Arc::new(RunControl::new()),
            batch_size: batch_size.max(1),
            file_timeout,
            analysis_enabled,
        }
    }

    /// Pause/resume/stop and status queries for the current run.
    pub fn control(&self) -> &Arc<RunControl> {
        &self.control
    }

    /// Current run snapshot. Never fails.
    pub async fn status(&self) -> ProcessingRun {
        self.control.snapshot().await
    }

    /// Run a sync pass without starting enrichment.
    pub async fn sync_only(&self) -> Result<SyncOutcome> {
        self.sync.sync().await
    }

    /// Sync, then enrich what the pass decided: everything after a full
    /// resync, only the changed files after a delta.
    pub async fn smart_process(self: &Arc<Self>, kind: Option<FileKind>) -> Result<RunHandle> {
        self.start(kind, Selection::Smart).await
    }

    /// Enrich every inventory row, without syncing first.
    pub async fn process_all(self: &Arc<Self>, kind: Option<FileKind>) -> Result<RunHandle> {
        self.start(kind, Selection::All).await
    }

    /// Sync, then enrich only the files that pass changed.
    pub async fn process_new(self: &Arc<Self>, kind: Option<FileKind>) -> Result<RunHandle> {
        self.start(kind, Selection::New).await
    }

    async fn start(self: &Arc<Self>, kind: Option<FileKind>, selection: Selection) -> Result<RunHandle> {
        // Acquire the run lock before any work so a second caller is
        // rejected immediately, not after a sync pass.
        let token = self.control.begin().await?;
        let this = Arc::clone(self);
        let join = tokio::spawn(async move { this.drive(kind, selection, token).await });
        Ok(RunHandle { join, control: self.control.clone() })
    }

    /// Background driver. Always records a terminal state: completion,
    /// stop, failure, and panic all end in `finish`.
    #[instrument(skip(self, token), fields(kind = ?kind, selection = ?selection))]
    async fn drive(self: Arc<Self>, kind: Option<FileKind>, selection: Selection, token: RunToken) {
        let result = AssertUnwindSafe(self.execute(kind, selection)).catch_unwind().await;
        match result {
            Ok(Ok(())) => self.control.finish(RunStatus::Completed, None).await,
            Ok(Err(err)) if matches!(&*err, ErrorKind::Stopped) => {
                self.control.finish(RunStatus::Stopped, None).await;
            },
            Ok(Err(err)) => {
                error!(error = %err, "run failed");
                self.control.finish(RunStatus::Failed, Some(err.to_string())).await;
            },
            Err(_panic) => {
                error!("run driver panicked");
                self.control.finish(RunStatus::Failed, Some("processing task panicked".to_string())).await;
            },
        }
        drop(token);
    }

    async fn execute(&self, kind: Option<FileKind>, selection: Selection) -> Result<()> {
        let files = self.select(kind, selection).await?;
        if !self.analysis_enabled {
            info!(candidates = files.len(), "analysis disabled, sync-only run");
            return Ok(());
        }
        self.control.set_total(files.len() as u64).await;
        info!(files = files.len(), "starting enrichment");
        for batch in files.chunks(self.batch_size) {
            // Pause and stop take effect here, between batches.
            self.control.checkpoint().await?;
            let current = batch.first().map(|record| record.path.clone());
            let results = join_all(batch.iter().map(|record| async move {
                let outcome =
                    tokio::time::timeout(self.file_timeout, self.processor.process_file(record)).await;
                (record, outcome)
            }))
            .await;
            let mut errors = Vec::new();
            for (record, result) in results {
                match result {
                    Ok(Ok(FileOutcome::Stored(_))) | Ok(Ok(FileOutcome::Skipped)) => {},
                    Ok(Ok(FileOutcome::NoEmbedding)) => {
                        errors.push(format!("{}: no embedding produced", record.path));
                    },
                    Ok(Err(err)) => errors.push(format!("{}: {err}", record.path)),
                    Err(_elapsed) => {
                        errors.push(format!(
                            "{}: timed out after {}s",
                            record.path,
                            self.file_timeout.as_secs()
                        ));
                    },
                }
            }
            self.control.record_batch(batch.len() as u64, current, errors).await;
        }
        Ok(())
    }

    /// The candidate files for this run, kind-filtered.
    async fn select(&self, kind: Option<FileKind>, selection: Selection) -> Result<Vec<RemoteFileRecord>> {
        let from_inventory = |kind: Option<FileKind>| async move {
            let kinds = kind.map(|k| vec![k]);
            let files =
                self.repo.list(None, kinds.as_deref()).await.or_raise(|| ErrorKind::Store)?;
            Ok::<_, crate::error::Error>(files.into_iter().map(|f| f.record).collect::<Vec<_>>())
        };
        let changed_only = |outcome: SyncOutcome, kind: Option<FileKind>| {
            outcome
                .changed
                .into_iter()
                .filter(|record| kind.is_none_or(|k| record.kind == k))
                .collect::<Vec<_>>()
        };
        match selection {
            Selection::All => from_inventory(kind).await,
            Selection::New => {
                let outcome = self.sync.sync().await?;
                Ok(changed_only(outcome, kind))
            },
            Selection::Smart => {
                let outcome = self.sync.sync().await?;
                match outcome.full_sync {
                    true => from_inventory(kind).await,
                    false => Ok(changed_only(outcome, kind)),
                }
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Selection {
    /// Everything currently in the inventory.
    All,
    /// Only what the preceding sync pass changed.
    New,
    /// Everything after a full resync, otherwise only changes.
    Smart,
}
