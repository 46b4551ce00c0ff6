// src/engine/trace.rs

//! Execution trace: ordered, timestamped lifecycle events per field.
//!
//! Every event gets a run-wide sequence number (assigned under the trace
//! lock, so sequence order is the order events were recorded) and an offset
//! from the start of the run. Events are mirrored to `tracing` at debug level.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::engine::FieldName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEventKind {
    /// The field's task registered and started.
    Started,
    /// A driver started waiting on `parent` on behalf of this field.
    AwaitingParent { parent: FieldName },
    /// `parent` confirmed; `fast_path` when it was already finished,
    /// `degraded` when the parent itself completed degraded.
    ParentResolved {
        parent: FieldName,
        fast_path: bool,
        degraded: bool,
    },
    /// The gate wait expired with `missing` parents unconfirmed.
    TimedOut { missing: Vec<FieldName> },
    /// A driver gave up waiting on `parent`.
    NotifierTimedOut { parent: FieldName },
    /// The field finished; `degraded` after a gate timeout.
    Completed { degraded: bool },
    /// The resolver failed.
    Failed { message: String },
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    pub seq: u64,
    pub field: FieldName,
    /// Offset from the start of the run.
    pub at: Duration,
    pub kind: TraceEventKind,
}

#[derive(Debug)]
pub struct ExecutionTrace {
    started: Instant,
    events: Mutex<Vec<TraceEvent>>,
}

impl Default for ExecutionTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn record(&self, field: &str, kind: TraceEventKind) {
        let at = self.started.elapsed();
        let mut events = self.events.lock();
        let seq = events.len() as u64;
        debug!(field = %field, seq, ?at, event = ?kind, "trace");
        events.push(TraceEvent {
            seq,
            field: field.to_string(),
            at,
            kind,
        });
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Copy of all events recorded so far, in sequence order.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }
}
