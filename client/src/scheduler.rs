//! Periodic and on-demand sync scheduling.
//!
//! All cycles run on one task, one after another, so a timer tick and a
//! manual trigger never overlap. A trigger arriving while a cycle runs is
//! queued (at most one) and runs right after.

use crate::error::Result;
use crate::orchestrator::{SyncOrchestrator, SyncReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};

/// Outcome of each cycle, in the order cycles finished.
pub type SyncOutcomes = mpsc::UnboundedReceiver<Result<SyncReport>>;

/// Handle to the background sync task.
#[derive(Debug)]
pub struct Scheduler {
    triggers: mpsc::Sender<()>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    /// Start the sync task. With `period` set, a cycle also runs on every
    /// tick, starting immediately.
    pub fn spawn(
        orchestrator: Arc<SyncOrchestrator>,
        period: Option<Duration>,
    ) -> (Self, SyncOutcomes) {
        let (triggers, trigger_rx) = mpsc::channel(1);
        let (shutdown, shutdown_rx) = oneshot::channel();
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();

        let ticker = period.map(|period| {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        let handle = tokio::spawn(run(orchestrator, ticker, trigger_rx, shutdown_rx, outcome_tx));

        (
            Self {
                triggers,
                shutdown: Some(shutdown),
                handle,
            },
            outcomes,
        )
    }

    /// Request a cycle. Returns false once the task has stopped.
    pub fn trigger(&self) -> bool {
        match self.triggers.try_send(()) {
            Ok(()) => true,
            // A run is already queued; this one folds into it
            Err(mpsc::error::TrySendError::Full(())) => true,
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }

    /// Stop the task. A cycle still in flight is abandoned without committing.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = (&mut self.handle).await;
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn run(
    orchestrator: Arc<SyncOrchestrator>,
    mut ticker: Option<Interval>,
    mut triggers: mpsc::Receiver<()>,
    mut shutdown: oneshot::Receiver<()>,
    outcomes: mpsc::UnboundedSender<Result<SyncReport>>,
) {
    tracing::debug!("Sync scheduler started");

    loop {
        let reason = tokio::select! {
            _ = &mut shutdown => break,
            trigger = triggers.recv() => match trigger {
                Some(()) => "manual",
                None => break,
            },
            _ = next_tick(&mut ticker) => "periodic",
        };

        tracing::debug!(reason, "Starting sync cycle");
        let outcome = tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Sync cycle abandoned at shutdown");
                break;
            }
            outcome = orchestrator.sync_cycle() => outcome,
        };

        if let Err(e) = &outcome {
            tracing::warn!(reason, error = %e, "Sync cycle failed");
        }
        if outcomes.send(outcome).is_err() {
            tracing::debug!("Outcome receiver dropped");
        }
    }

    tracing::debug!("Sync scheduler stopped");
}
