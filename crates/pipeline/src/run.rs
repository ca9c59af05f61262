//! Processing run state and control.

use crate::error::{ErrorKind, Result};
use serde::Serialize;
use std::sync::Arc;
use time::UtcDateTime;
use tokio::sync::{watch, Mutex, OwnedMutexGuard, RwLock};
use tracing::info;

/// Lifecycle of a processing run.
///
/// Transitions: Idle → Running → {Paused ⇄ Running} → {Completed | Stopped
/// | Failed}. Terminal states never transition further; a new run starts
/// from Idle again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Running,
    Paused,
    Stopped,
    Completed,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Snapshot of the current (or last) run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingRun {
    pub status: RunStatus,
    pub files_total: u64,
    /// Monotonic; incremented once per completed batch.
    pub files_processed: u64,
    pub current_file: Option<String>,
    pub start_time: Option<UtcDateTime>,
    pub end_time: Option<UtcDateTime>,
    /// Append-only per-file error descriptions.
    pub errors: Vec<String>,
}

impl ProcessingRun {
    fn idle() -> Self {
        Self {
            status: RunStatus::Idle,
            files_total: 0,
            files_processed: 0,
            current_file: None,
            start_time: None,
            end_time: None,
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct GateState {
    paused: bool,
    stopped: bool,
}

/// Holding this token is what makes a run "active": it owns the exclusive
/// run lock and releases it on drop, whatever way the driver ends.
#[derive(Debug)]
pub(crate) struct RunToken {
    _permit: OwnedMutexGuard<()>,
}

/// Shared control surface for runs: the exclusive lock, the pause/stop
/// gate, and the observable run snapshot.
///
/// Cancellation is cooperative. The driver calls
/// [`checkpoint`](Self::checkpoint) at batch boundaries; pause and stop
/// take effect there, never mid-batch.
#[derive(Debug)]
pub struct RunControl {
    lock: Arc<Mutex<()>>,
    gate: watch::Sender<GateState>,
    run: RwLock<ProcessingRun>,
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RunControl {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(GateState::default());
        Self { lock: Arc::new(Mutex::new(())), gate, run: RwLock::new(ProcessingRun::idle()) }
    }

    /// Start a run. Fails fast with [`ErrorKind::Conflict`] while another
    /// run holds the lock; never queues behind it.
    pub(crate) async fn begin(&self) -> Result<RunToken> {
        let permit = match self.lock.clone().try_lock_owned() {
            Ok(permit) => permit,
            Err(_) => exn::bail!(ErrorKind::Conflict),
        };
        self.gate.send_replace(GateState::default());
        *self.run.write().await = ProcessingRun {
            status: RunStatus::Running,
            start_time: Some(UtcDateTime::now()),
            ..ProcessingRun::idle()
        };
        Ok(RunToken { _permit: permit })
    }

    /// Block while paused; fail with [`ErrorKind::Stopped`] once stop was
    /// requested. Called at every batch boundary.
    pub(crate) async fn checkpoint(&self) -> Result<()> {
        let mut gate = self.gate.subscribe();
        loop {
            let state = *gate.borrow_and_update();
            if state.stopped {
                exn::bail!(ErrorKind::Stopped);
            }
            if !state.paused {
                return Ok(());
            }
            if gate.changed().await.is_err() {
                return Ok(());
            }
        }
    }

    pub(crate) async fn set_total(&self, total: u64) {
        self.run.write().await.files_total = total;
    }

    pub(crate) async fn record_batch(&self, attempted: u64, current: Option<String>, errors: Vec<String>) {
        let mut run = self.run.write().await;
        run.files_processed += attempted;
        run.current_file = current;
        run.errors.extend(errors);
    }

    /// Record the terminal state. Always called by the driver, on success,
    /// failure, stop, and panic alike.
    pub(crate) async fn finish(&self, status: RunStatus, error: Option<String>) {
        let mut run = self.run.write().await;
        run.status = status;
        run.end_time = Some(UtcDateTime::now());
        run.current_file = None;
        if let Some(error) = error {
            run.errors.push(error);
        }
        info!(status = %status, processed = run.files_processed, errors = run.errors.len(), "run finished");
    }

    /// Close the pause gate. The in-flight batch completes first. No-op
    /// unless a run is active and stop was not requested.
    pub fn pause(&self) {
        self.gate.send_if_modified(|state| match state.stopped || state.paused {
            true => false,
            false => {
                state.paused = true;
                true
            },
        });
    }

    /// Reopen the pause gate. No-op after stop: stop is irreversible.
    pub fn resume(&self) {
        self.gate.send_if_modified(|state| match !state.paused || state.stopped {
            true => false,
            false => {
                state.paused = false;
                true
            },
        });
    }

    /// Request a stop. Forces the gate open so a paused run can observe it.
    pub fn stop(&self) {
        self.gate.send_if_modified(|state| {
            state.stopped = true;
            state.paused = false;
            true
        });
    }

    /// Current run snapshot. Reports `Paused` whenever the gate is closed,
    /// even if the in-flight batch is still draining. Never fails.
    pub async fn snapshot(&self) -> ProcessingRun {
        let mut run = self.run.read().await.clone();
        let state = *self.gate.borrow();
        if run.status == RunStatus::Running && state.paused && !state.stopped {
            run.status = RunStatus::Paused;
        }
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_begin_is_exclusive() {
        let control = RunControl::new();
        let token = control.begin().await.unwrap();
        let err = control.begin().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Conflict));
        drop(token);
        let _token = control.begin().await.unwrap();
    }

    #[tokio::test]
    async fn test_checkpoint_passes_when_open() {
        let control = RunControl::new();
        let _token = control.begin().await.unwrap();
        control.checkpoint().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_fails_checkpoint() {
        let control = RunControl::new();
        let _token = control.begin().await.unwrap();
        control.stop();
        let err = control.checkpoint().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Stopped));
    }

    #[tokio::test]
    async fn test_pause_blocks_until_resume() {
        let control = Arc::new(RunControl::new());
        let _token = control.begin().await.unwrap();
        control.pause();
        assert_eq!(control.snapshot().await.status, RunStatus::Paused);

        let waiter = {
            let control = control.clone();
            tokio::spawn(async move { control.checkpoint().await })
        };
        // the checkpoint must not pass while paused
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        control.resume();
        waiter.await.unwrap().unwrap();
        assert_eq!(control.snapshot().await.status, RunStatus::Running);
    }

    #[tokio::test]
    async fn test_stop_releases_paused_checkpoint() {
        let control = Arc::new(RunControl::new());
        let _token = control.begin().await.unwrap();
        control.pause();
        let waiter = {
            let control = control.clone();
            tokio::spawn(async move { control.checkpoint().await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        control.stop();
        let err = waiter.await.unwrap().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Stopped));
    }

    #[tokio::test]
    async fn test_resume_after_stop_is_noop() {
        let control = RunControl::new();
        let _token = control.begin().await.unwrap();
        control.stop();
        control.resume();
        assert!(control.checkpoint().await.is_err());
    }

    #[tokio::test]
    async fn test_snapshot_progress_and_finish() {
        let control = RunControl::new();
        let token = control.begin().await.unwrap();
        control.set_total(10).await;
        control.record_batch(4, Some("a.jpg".to_string()), vec!["b.jpg: boom".to_string()]).await;
        let snapshot = control.snapshot().await;
        assert_eq!(snapshot.status, RunStatus::Running);
        assert_eq!(snapshot.files_total, 10);
        assert_eq!(snapshot.files_processed, 4);
        assert_eq!(snapshot.current_file.as_deref(), Some("a.jpg"));
        assert_eq!(snapshot.errors.len(), 1);

        control.finish(RunStatus::Completed, None).await;
        drop(token);
        let snapshot = control.snapshot().await;
        assert_eq!(snapshot.status, RunStatus::Completed);
        assert!(snapshot.end_time.is_some());
        assert!(snapshot.current_file.is_none());
    }
}
