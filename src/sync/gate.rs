// src/sync/gate.rs

use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::trace;

use crate::engine::FieldName;
use crate::sync::WaitOutcome;

/// What a call to [`ReadinessGate::release`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRelease {
    /// One parent accounted for; `remaining` still outstanding.
    Accepted { remaining: usize },
    /// This release was the last one and opened the gate.
    Opened,
    /// The parent had already released this gate.
    Duplicate,
    /// The parent is not one of the child's declared parents.
    Unknown,
}

/// Join over one release per declared parent of a child field.
///
/// Conceptually a countdown starting at `|parents|`, but each release is
/// keyed by parent name: a parent can only take the count down once, so
/// the count can neither go negative nor be decremented more than
/// `|parents|` times, however many drivers race on it.
///
/// Only built for fields with at least one parent.
#[derive(Debug)]
pub struct ReadinessGate {
    field: FieldName,
    declared: BTreeSet<FieldName>,
    pending: Mutex<BTreeSet<FieldName>>,
    open: watch::Sender<bool>,
}

impl ReadinessGate {
    /// `None` when `parents` is empty.
    pub fn new(field: impl Into<FieldName>, parents: &[FieldName]) -> Option<Self> {
        let declared: BTreeSet<FieldName> = parents.iter().cloned().collect();
        if declared.is_empty() {
            return None;
        }
        let (open, _rx) = watch::channel(false);
        Some(Self {
            field: field.into(),
            pending: Mutex::new(declared.clone()),
            declared,
            open,
        })
    }

    /// Number of releases needed to open the gate.
    pub fn expected(&self) -> usize {
        self.declared.len()
    }

    pub fn remaining(&self) -> usize {
        self.pending.lock().len()
    }

    /// Parents that have not released yet.
    pub fn missing(&self) -> Vec<FieldName> {
        self.pending.lock().iter().cloned().collect()
    }

    pub fn is_open(&self) -> bool {
        *self.open.borrow()
    }

    /// Account for `parent`'s completion.
    pub fn release(&self, parent: &str) -> GateRelease {
        let mut pending = self.pending.lock();
        if !pending.remove(parent) {
            return if self.declared.contains(parent) {
                GateRelease::Duplicate
            } else {
                GateRelease::Unknown
            };
        }

        let remaining = pending.len();
        if remaining == 0 {
            // Opened while still holding the lock, so it happens exactly once.
            self.open.send_replace(true);
            trace!(field = %self.field, last = %parent, "readiness gate opened");
            GateRelease::Opened
        } else {
            GateRelease::Accepted { remaining }
        }
    }

    /// Wait until every parent released the gate, or until `limit` has
    /// elapsed counting from when `clock_start` resolves. The gate may still
    /// open before the countdown starts.
    pub async fn wait_from(
        &self,
        clock_start: impl Future<Output = ()>,
        limit: Duration,
    ) -> WaitOutcome {
        let mut rx = self.open.subscribe();
        tokio::select! {
            biased;
            res = async { rx.wait_for(|open| *open).await.map(|_| ()) } => match res {
                Ok(_) => WaitOutcome::Signalled,
                Err(_) => WaitOutcome::TimedOut,
            },
            _ = async {
                clock_start.await;
                sleep(limit).await;
            } => WaitOutcome::TimedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use std::future;

    use super::*;

    fn names(n: &[&str]) -> Vec<FieldName> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_gate_without_parents() {
        assert!(ReadinessGate::new("A", &[]).is_none());
    }

    #[test]
    fn each_parent_counts_once() {
        let gate = ReadinessGate::new("C", &names(&["A", "B"])).unwrap();
        assert_eq!(gate.expected(), 2);

        assert_eq!(gate.release("A"), GateRelease::Accepted { remaining: 1 });
        assert_eq!(gate.release("A"), GateRelease::Duplicate);
        assert_eq!(gate.release("Z"), GateRelease::Unknown);
        assert!(!gate.is_open());
        assert_eq!(gate.missing(), names(&["B"]));

        assert_eq!(gate.release("B"), GateRelease::Opened);
        assert!(gate.is_open());
        assert_eq!(gate.remaining(), 0);
        assert_eq!(gate.release("B"), GateRelease::Duplicate);
    }

    #[tokio::test]
    async fn wait_returns_immediately_once_open() {
        let gate = ReadinessGate::new("B", &names(&["A"])).unwrap();
        gate.release("A");
        let outcome = gate.wait_from(future::ready(()), Duration::from_millis(5)).await;
        assert_eq!(outcome, WaitOutcome::Signalled);
    }

    #[tokio::test]
    async fn wait_times_out_with_parents_missing() {
        let gate = ReadinessGate::new("B", &names(&["A", "X"])).unwrap();
        gate.release("A");
        let outcome = gate.wait_from(future::ready(()), Duration::from_millis(20)).await;
        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert_eq!(gate.remaining(), 1);
    }

    #[tokio::test]
    async fn countdown_waits_for_clock_start() {
        let gate = Arc::new(ReadinessGate::new("B", &names(&["A"])).unwrap());
        let releaser = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(40)).await;
                gate.release("A");
            })
        };

        // A 5 ms budget that only starts counting after 100 ms.
        let outcome = gate
            .wait_from(tokio::time::sleep(Duration::from_millis(100)), Duration::from_millis(5))
            .await;
        assert_eq!(outcome, WaitOutcome::Signalled);
        releaser.await.unwrap();

        let stuck = ReadinessGate::new("C", &names(&["A"])).unwrap();
        let outcome = stuck
            .wait_from(tokio::time::sleep(Duration::from_millis(10)), Duration::from_millis(10))
            .await;
        assert_eq!(outcome, WaitOutcome::TimedOut);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_releases_never_over_count() {
        let parents: Vec<FieldName> = (0..64).map(|i| format!("p{i}")).collect();
        let gate = Arc::new(ReadinessGate::new("child", &parents).unwrap());
        let opened = Arc::new(AtomicUsize::new(0));
        let accepted = Arc::new(AtomicUsize::new(0));

        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                gate.wait_from(future::ready(()), Duration::from_secs(5)).await
            })
        };

        // Every parent releases three times from different tasks.
        let mut handles = Vec::new();
        for round in 0..3 {
            for p in parents.iter().cloned() {
                let gate = Arc::clone(&gate);
                let opened = Arc::clone(&opened);
                let accepted = Arc::clone(&accepted);
                handles.push(tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_micros(fastrand::u64(0..500) * (round + 1))).await;
                    match gate.release(&p) {
                        GateRelease::Opened => {
                            opened.fetch_add(1, Ordering::SeqCst);
                            accepted.fetch_add(1, Ordering::SeqCst);
                        }
                        GateRelease::Accepted { .. } => {
                            accepted.fetch_add(1, Ordering::SeqCst);
                        }
                        GateRelease::Duplicate | GateRelease::Unknown => {}
                    }
                }));
            }
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(waiter.await.unwrap(), WaitOutcome::Signalled);
        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert_eq!(accepted.load(Ordering::SeqCst), parents.len());
        assert_eq!(gate.remaining(), 0);
        assert_eq!(gate.expected(), parents.len());
    }
}
