//! The replay loop: one task per run, emitting source records in order and
//! starting over when the source is exhausted.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use motorwatch_core::csv::CsvRecord;
use motorwatch_core::replay::ReplayPhase;

use crate::controller::Shared;
use crate::sender::IngestSink;
use crate::source::RecordSource;

/// Everything a single run needs. Counts itself in `Shared::live_loops`
/// for as long as it exists.
pub(crate) struct RunContext {
    id: u64,
    shared: Arc<Shared>,
    source: Arc<dyn RecordSource>,
    sink: Arc<dyn IngestSink>,
    cancel: CancellationToken,
}

impl RunContext {
    pub(crate) fn new(
        id: u64,
        shared: Arc<Shared>,
        source: Arc<dyn RecordSource>,
        sink: Arc<dyn IngestSink>,
        cancel: CancellationToken,
    ) -> Self {
        shared.live_loops.fetch_add(1, Ordering::SeqCst);
        Self {
            id,
            shared,
            source,
            sink,
            cancel,
        }
    }
}

impl Drop for RunContext {
    fn drop(&mut self) {
        self.shared.live_loops.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Replay `records`, then keep reopening the source, until cancelled or the
/// source can no longer be opened.
pub(crate) async fn run(ctx: RunContext, mut records: Vec<CsvRecord>) {
    let mut phase_rx = ctx.shared.phase.subscribe();

    loop {
        if !ctx.replay_pass(&records, &mut phase_rx).await {
            break;
        }

        records = match ctx.source.open().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(
                    run_id = ctx.id,
                    source = %ctx.source.describe(),
                    error = %e,
                    "Failed to reopen replay source"
                );
                ctx.shared.release_run(ctx.id).await;
                break;
            }
        };
    }

    tracing::info!(run_id = ctx.id, "Replay loop exited");
}

impl RunContext {
    /// Emit every record once. Returns `false` if the run was cancelled.
    async fn replay_pass(
        &self,
        records: &[CsvRecord],
        phase_rx: &mut watch::Receiver<ReplayPhase>,
    ) -> bool {
        if records.is_empty() {
            tracing::warn!(run_id = self.id, "Replay source has no records");
            return self.wait_interval().await;
        }

        let mut attempts = 0usize;
        for record in records {
            if !self.wait_until_running(phase_rx).await {
                return false;
            }

            let reading = match record.to_raw_reading().validate() {
                Ok(reading) => reading,
                Err(e) => {
                    tracing::warn!(run_id = self.id, line = record.line, error = %e, "Skipping invalid record");
                    self.shared.stats.write().await.skipped_count += 1;
                    continue;
                }
            };

            attempts += 1;
            let delivered = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                result = self.sink.deliver(&reading) => result,
            };

            match delivered {
                Ok(()) => {
                    let mut stats = self.shared.stats.write().await;
                    stats.emitted_count += 1;
                    stats.last_emitted_at = Some(Utc::now());
                    tracing::debug!(
                        run_id = self.id,
                        machine_id = %reading.entity_id,
                        actuator_id = %reading.channel_id,
                        emitted_count = stats.emitted_count,
                        "Reading delivered"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        run_id = self.id,
                        line = record.line,
                        sink = %self.sink.describe(),
                        error = %e,
                        "Failed to deliver reading"
                    );
                    self.shared.stats.write().await.failed_count += 1;
                }
            }

            if !self.wait_interval().await {
                return false;
            }
        }

        // A pass with nothing deliverable still paces the loop.
        if attempts == 0 {
            tracing::warn!(run_id = self.id, records = records.len(), "No valid records in replay source");
            if !self.wait_interval().await {
                return false;
            }
        }

        let cycles = {
            let mut stats = self.shared.stats.write().await;
            stats.cycles += 1;
            stats.cycles
        };
        tracing::info!(run_id = self.id, cycles, "Source exhausted, starting over");
        true
    }

    /// Block while paused. Returns `false` once the run is cancelled.
    async fn wait_until_running(&self, phase_rx: &mut watch::Receiver<ReplayPhase>) -> bool {
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            let phase = *phase_rx.borrow_and_update();
            match phase {
                ReplayPhase::Running => return true,
                ReplayPhase::Stopped => return false,
                ReplayPhase::Paused => {}
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                changed = phase_rx.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }

    /// Sleep for the current interval. Returns `false` if cancelled first.
    async fn wait_interval(&self) -> bool {
        let interval = self.shared.stats.read().await.interval;
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            () = tokio::time::sleep(interval) => true,
        }
    }
}
