//! Replay control state machine.
//!
//! [`ReplayController`] owns the phase (`stopped`, `running`, `paused`), the
//! emission counters and the current interval. Control operations never fail
//! for a transition that does not apply; they report a no-op instead.
//!
//! Each `start` spawns one replay task with its own [`CancellationToken`].
//! `stop` cancels that token under the control lock before publishing the
//! `stopped` phase, so a loop from an earlier run can never observe a later
//! `running` phase and carry on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use motorwatch_core::error::CoreError;
use motorwatch_core::replay::{IntervalLimits, ReplayPhase};
use motorwatch_core::types::Timestamp;

use crate::replay::{self, RunContext};
use crate::sender::IngestSink;
use crate::source::{RecordSource, SourceError};

/// How long `stop` waits for the replay task to exit.
pub const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// The source could not be opened; replay stays stopped.
    #[error("Replay source unavailable: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Snapshot of the controller for status and health output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayStatus {
    pub phase: ReplayPhase,
    /// Readings the analysis service confirmed. Never reset.
    pub emitted_count: u64,
    /// Source records rejected by validation.
    pub skipped_count: u64,
    /// Deliveries that failed (network error or non-2xx).
    pub failed_count: u64,
    pub interval_secs: f64,
    pub last_emitted_at: Option<Timestamp>,
    /// Completed passes over the source.
    pub cycles: u64,
}

/// Result of a control operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlOutcome {
    /// Whether the operation changed anything.
    pub changed: bool,
    pub message: String,
    pub status: ReplayStatus,
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Counters and interval, updated by the replay task.
#[derive(Debug)]
pub(crate) struct ReplayStats {
    pub(crate) emitted_count: u64,
    pub(crate) skipped_count: u64,
    pub(crate) failed_count: u64,
    pub(crate) cycles: u64,
    pub(crate) last_emitted_at: Option<Timestamp>,
    pub(crate) interval: Duration,
}

struct ActiveRun {
    id: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub(crate) struct ControlState {
    run: Option<ActiveRun>,
    next_run_id: u64,
}

/// State shared between the controller and its replay task.
pub(crate) struct Shared {
    pub(crate) phase: watch::Sender<ReplayPhase>,
    pub(crate) stats: RwLock<ReplayStats>,
    pub(crate) control: Mutex<ControlState>,
    pub(crate) live_loops: AtomicUsize,
}

impl Shared {
    /// Detach run `id` after its loop ended on its own.
    ///
    /// Does nothing if the run was already stopped or replaced.
    pub(crate) async fn release_run(&self, id: u64) {
        let mut control = self.control.lock().await;
        if control.run.as_ref().is_some_and(|run| run.id == id) {
            control.run = None;
            self.phase.send_replace(ReplayPhase::Stopped);
            tracing::warn!(run_id = id, "Replay stopped after source failure");
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Start/pause/resume/stop control over one replay loop.
pub struct ReplayController {
    shared: Arc<Shared>,
    limits: IntervalLimits,
    source: Arc<dyn RecordSource>,
    sink: Arc<dyn IngestSink>,
}

impl ReplayController {
    /// Create a stopped controller. `interval_secs` is clamped into `limits`.
    pub fn new(
        source: Arc<dyn RecordSource>,
        sink: Arc<dyn IngestSink>,
        limits: IntervalLimits,
        interval_secs: f64,
    ) -> Result<Self, CoreError> {
        let interval = limits.clamp(interval_secs)?;
        let (phase, _) = watch::channel(ReplayPhase::Stopped);

        Ok(Self {
            shared: Arc::new(Shared {
                phase,
                stats: RwLock::new(ReplayStats {
                    emitted_count: 0,
                    skipped_count: 0,
                    failed_count: 0,
                    cycles: 0,
                    last_emitted_at: None,
                    interval,
                }),
                control: Mutex::new(ControlState::default()),
                live_loops: AtomicUsize::new(0),
            }),
            limits,
            source,
            sink,
        })
    }

    pub fn phase(&self) -> ReplayPhase {
        *self.shared.phase.borrow()
    }

    pub fn limits(&self) -> IntervalLimits {
        self.limits
    }

    /// Number of replay tasks that have not exited yet.
    pub fn live_loops(&self) -> usize {
        self.shared.live_loops.load(Ordering::SeqCst)
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    pub fn sink_description(&self) -> String {
        self.sink.describe()
    }

    pub async fn status(&self) -> ReplayStatus {
        let phase = self.phase();
        let stats = self.shared.stats.read().await;
        ReplayStatus {
            phase,
            emitted_count: stats.emitted_count,
            skipped_count: stats.skipped_count,
            failed_count: stats.failed_count,
            interval_secs: stats.interval.as_secs_f64(),
            last_emitted_at: stats.last_emitted_at,
            cycles: stats.cycles,
        }
    }

    /// Stopped → Running. Opens the source before anything changes; if that
    /// fails the controller stays stopped.
    pub async fn start(&self) -> Result<ControlOutcome, ReplayError> {
        let mut control = self.shared.control.lock().await;

        match self.phase() {
            ReplayPhase::Running => {
                drop(control);
                return Ok(self.outcome(false, "already running").await);
            }
            ReplayPhase::Paused => {
                drop(control);
                return Ok(self.outcome(false, "paused, use resume to continue").await);
            }
            ReplayPhase::Stopped => {}
        }

        let records = self.source.open().await.inspect_err(|e| {
            tracing::error!(source = %self.source.describe(), error = %e, "Failed to open replay source");
        })?;
        let record_count = records.len();

        if let Some(stale) = control.run.take() {
            stale.cancel.cancel();
        }

        control.next_run_id += 1;
        let id = control.next_run_id;
        let cancel = CancellationToken::new();

        self.shared.phase.send_replace(ReplayPhase::Running);
        let ctx = RunContext::new(
            id,
            Arc::clone(&self.shared),
            Arc::clone(&self.source),
            Arc::clone(&self.sink),
            cancel.clone(),
        );
        let handle = tokio::spawn(replay::run(ctx, records));
        control.run = Some(ActiveRun { id, cancel, handle });
        drop(control);

        tracing::info!(
            run_id = id,
            records = record_count,
            source = %self.source.describe(),
            "Replay started"
        );
        Ok(self.outcome(true, "replay started").await)
    }

    /// Running → Paused.
    pub async fn pause(&self) -> ControlOutcome {
        let message = {
            let _control = self.shared.control.lock().await;
            match self.phase() {
                ReplayPhase::Running => {
                    self.shared.phase.send_replace(ReplayPhase::Paused);
                    None
                }
                ReplayPhase::Paused => Some("already paused"),
                ReplayPhase::Stopped => Some("not running, nothing to pause"),
            }
        };

        match message {
            None => {
                tracing::info!("Replay paused");
                self.outcome(true, "replay paused").await
            }
            Some(message) => self.outcome(false, message).await,
        }
    }

    /// Paused → Running.
    pub async fn resume(&self) -> ControlOutcome {
        let message = {
            let _control = self.shared.control.lock().await;
            match self.phase() {
                ReplayPhase::Paused => {
                    self.shared.phase.send_replace(ReplayPhase::Running);
                    None
                }
                ReplayPhase::Running => Some("already running"),
                ReplayPhase::Stopped => Some("not running, nothing to resume"),
            }
        };

        match message {
            None => {
                tracing::info!("Replay resumed");
                self.outcome(true, "replay resumed").await
            }
            Some(message) => self.outcome(false, message).await,
        }
    }

    /// Running|Paused → Stopped, then wait (bounded) for the task to exit.
    pub async fn stop(&self) -> ControlOutcome {
        let run = {
            let mut control = self.shared.control.lock().await;
            if !self.phase().is_active() {
                drop(control);
                return self.outcome(false, "not running, nothing to stop").await;
            }
            let run = control.run.take();
            if let Some(run) = &run {
                run.cancel.cancel();
            }
            self.shared.phase.send_replace(ReplayPhase::Stopped);
            run
        };

        if let Some(run) = run {
            join_run(run).await;
        }
        tracing::info!("Replay stopped");
        self.outcome(true, "replay stopped").await
    }

    /// Change the emission interval. Legal in every phase; takes effect at
    /// the next wait.
    pub async fn set_interval(&self, secs: f64) -> Result<ControlOutcome, ReplayError> {
        let interval = self.limits.clamp(secs)?;
        let previous = std::mem::replace(&mut self.shared.stats.write().await.interval, interval);

        let applied = interval.as_secs_f64();
        let message = if secs < self.limits.min_secs() || secs > self.limits.max_secs() {
            format!("interval set to {applied}s (requested {secs}s, clamped)")
        } else {
            format!("interval set to {applied}s")
        };

        tracing::info!(requested = secs, interval_secs = applied, "Replay interval changed");
        Ok(self.outcome(previous != interval, message).await)
    }

    async fn outcome(&self, changed: bool, message: impl Into<String>) -> ControlOutcome {
        ControlOutcome {
            changed,
            message: message.into(),
            status: self.status().await,
        }
    }
}

async fn join_run(run: ActiveRun) {
    match tokio::time::timeout(STOP_JOIN_TIMEOUT, run.handle).await {
        Ok(Ok(())) => tracing::debug!(run_id = run.id, "Replay task joined"),
        Ok(Err(e)) => tracing::error!(run_id = run.id, error = %e, "Replay task failed"),
        Err(_) => tracing::warn!(
            run_id = run.id,
            timeout_secs = STOP_JOIN_TIMEOUT.as_secs(),
            "Replay task did not exit in time"
        ),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use motorwatch_core::reading::Reading;

    use super::*;
    use crate::sender::DeliveryError;
    use crate::source::{CsvFileSource, MemorySource};

    struct NullSink;

    #[async_trait]
    impl IngestSink for NullSink {
        async fn deliver(&self, _reading: &Reading) -> Result<(), DeliveryError> {
            Ok(())
        }

        fn describe(&self) -> String {
            "null".into()
        }
    }

    fn controller(source: Arc<dyn RecordSource>) -> ReplayController {
        ReplayController::new(source, Arc::new(NullSink), IntervalLimits::default(), 3.0).unwrap()
    }

    #[tokio::test]
    async fn new_controller_is_stopped() {
        let c = controller(Arc::new(MemorySource::default()));
        let status = c.status().await;
        assert_eq!(status.phase, ReplayPhase::Stopped);
        assert_eq!(status.emitted_count, 0);
        assert_eq!(status.interval_secs, 3.0);
        assert_eq!(status.last_emitted_at, None);
    }

    #[tokio::test]
    async fn initial_interval_is_clamped() {
        let c = ReplayController::new(
            Arc::new(MemorySource::default()),
            Arc::new(NullSink),
            IntervalLimits::default(),
            0.0,
        )
        .unwrap();
        assert_eq!(c.status().await.interval_secs, 0.2);
    }

    #[tokio::test]
    async fn pause_on_stopped_is_a_noop() {
        let c = controller(Arc::new(MemorySource::default()));
        let outcome = c.pause().await;
        assert!(!outcome.changed);
        assert_eq!(outcome.status.phase, ReplayPhase::Stopped);
        assert_eq!(outcome.message, "not running, nothing to pause");
    }

    #[tokio::test]
    async fn resume_and_stop_on_stopped_are_noops() {
        let c = controller(Arc::new(MemorySource::default()));
        assert!(!c.resume().await.changed);
        assert!(!c.stop().await.changed);
        assert_eq!(c.phase(), ReplayPhase::Stopped);
    }

    #[tokio::test]
    async fn set_interval_clamps_in_any_phase() {
        let c = controller(Arc::new(MemorySource::default()));

        let low = c.set_interval(0.01).await.unwrap();
        assert_eq!(low.status.interval_secs, 0.2);
        assert!(low.message.contains("clamped"));

        let high = c.set_interval(100.0).await.unwrap();
        assert_eq!(high.status.interval_secs, 30.0);
        assert!(high.changed);

        let same = c.set_interval(30.0).await.unwrap();
        assert!(!same.changed);
    }

    #[tokio::test]
    async fn non_finite_interval_is_rejected() {
        let c = controller(Arc::new(MemorySource::default()));
        assert_matches!(
            c.set_interval(f64::NAN).await,
            Err(ReplayError::Core(CoreError::Validation(_)))
        );
        assert_eq!(c.status().await.interval_secs, 3.0);
    }

    #[tokio::test]
    async fn unreadable_source_keeps_controller_stopped() {
        let c = controller(Arc::new(CsvFileSource::new("/no/such/actuator_data.csv")));
        assert_matches!(c.start().await, Err(ReplayError::Source(SourceError::Io { .. })));
        assert_eq!(c.phase(), ReplayPhase::Stopped);
        assert_eq!(c.live_loops(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn start_pause_resume_stop_cycle() {
        let source = MemorySource::from_csv(
            "ts,machine_id,actuator_id,motor_temp_c,motor_rpm,motor_vibration_rms\n\
             t1,arm_01,base,40,1000,0.1\n",
        )
        .unwrap();
        let c = controller(Arc::new(source));

        assert!(c.start().await.unwrap().changed);
        assert_eq!(c.phase(), ReplayPhase::Running);
        assert!(!c.start().await.unwrap().changed);

        assert!(c.pause().await.changed);
        assert_eq!(c.start().await.unwrap().message, "paused, use resume to continue");
        assert!(!c.pause().await.changed);

        assert!(c.resume().await.changed);
        assert!(!c.resume().await.changed);

        let stopped = c.stop().await;
        assert!(stopped.changed);
        assert_eq!(stopped.status.phase, ReplayPhase::Stopped);
        assert_eq!(c.live_loops(), 0);
    }
}
