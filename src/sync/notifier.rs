// src/sync/notifier.rs

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::engine::FieldName;
use crate::sync::WaitOutcome;

/// Broadcast-once completion signal for a parent field.
///
/// Firing is sticky: every current waiter wakes, and any waiter that shows
/// up later returns straight away. Firing twice is a no-op.
#[derive(Debug)]
pub struct CompletionSignal {
    tx: watch::Sender<bool>,
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Fire the signal. Returns `true` only for the call that fired it.
    pub fn fire(&self) -> bool {
        self.tx.send_if_modified(|fired| {
            if *fired {
                false
            } else {
                *fired = true;
                true
            }
        })
    }

    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the signal fires, or until `limit` has elapsed counting
    /// from when `clock_start` resolves.
    pub async fn wait_from(
        &self,
        clock_start: impl Future<Output = ()>,
        limit: Duration,
    ) -> WaitOutcome {
        let mut rx = self.tx.subscribe();
        tokio::select! {
            biased;
            res = async { rx.wait_for(|fired| *fired).await.map(|_| ()) } => match res {
                Ok(_) => WaitOutcome::Signalled,
                // The sender lives in `self`, so the channel cannot close under us.
                Err(_) => WaitOutcome::TimedOut,
            },
            _ = async {
                clock_start.await;
                sleep(limit).await;
            } => WaitOutcome::TimedOut,
        }
    }
}

/// Per-run lookup of completion signals, created on first use.
///
/// Both the parent's own task and the drivers waiting on it call
/// [`NotifierSet::ensure`]; whichever comes first creates the signal.
#[derive(Debug, Default)]
pub struct NotifierSet {
    signals: DashMap<FieldName, Arc<CompletionSignal>>,
}

impl NotifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure(&self, field: &str) -> Arc<CompletionSignal> {
        self.signals
            .entry(field.to_string())
            .or_insert_with(|| Arc::new(CompletionSignal::new()))
            .value()
            .clone()
    }
}
