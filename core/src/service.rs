//! Periodic reconciliation service.
//!
//! RULES:
//!   - One pass at a time. The timer loop and on-demand callers share one
//!     mutex around the Reconciler, so passes queue instead of overlapping.
//!   - The first pass runs immediately on start, then every `interval`.
//!     Ticks missed while a pass is running are skipped, not replayed.
//!   - Passes run on the blocking pool; SQLite and directory listing are
//!     synchronous.

use crate::{
    error::{ChromoError, ChromoResult},
    reconcile::{CaseRepository, PassReport, Reconciler},
    scanner::EntrySource,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub struct ReconcileService<R: CaseRepository, S: EntrySource> {
    reconciler: Arc<Mutex<Reconciler<R, S>>>,
    interval: Duration,
}

impl<R, S> ReconcileService<R, S>
where
    R: CaseRepository + 'static,
    S: EntrySource + 'static,
{
    pub fn new(reconciler: Reconciler<R, S>, interval: Duration) -> Self {
        Self {
            reconciler: Arc::new(Mutex::new(reconciler)),
            interval,
        }
    }

    /// Spawn the timer loop. Must be called inside a tokio runtime.
    pub fn start(&self) -> ServiceHandle {
        let token = CancellationToken::new();
        let loop_token = token.clone();
        let reconciler = Arc::clone(&self.reconciler);
        let period = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            log::info!("reconcile service started, interval={}s", period.as_secs());

            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = ticker.tick() => {
                        let reconciler = Arc::clone(&reconciler);
                        let outcome = tokio::task::spawn_blocking(move || {
                            match reconciler.lock() {
                                Ok(mut r) => {
                                    r.reconcile();
                                }
                                Err(_) => log::error!("reconciler lock poisoned, pass skipped"),
                            }
                        })
                        .await;
                        if let Err(e) = outcome {
                            log::error!("reconcile task failed: {e}");
                        }
                    }
                }
            }
            log::info!("reconcile service stopped");
        });

        ServiceHandle { token, task }
    }

    /// Run one pass now, queued behind any pass already in flight.
    pub async fn run_now(&self) -> ChromoResult<PassReport> {
        let reconciler = Arc::clone(&self.reconciler);
        tokio::task::spawn_blocking(move || {
            let mut r = reconciler
                .lock()
                .map_err(|_| ChromoError::Task("reconciler lock poisoned".into()))?;
            r.run_pass()
        })
        .await
        .map_err(|e| ChromoError::Task(e.to_string()))?
    }

    /// Shared access to the reconciler, e.g. to inspect its repository.
    pub fn reconciler(&self) -> Arc<Mutex<Reconciler<R, S>>> {
        Arc::clone(&self.reconciler)
    }
}

/// Owns a running timer loop.
pub struct ServiceHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ServiceHandle {
    /// Stop the loop and wait for it. A pass already running finishes first.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            log::error!("reconcile service task ended abnormally: {e}");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}
