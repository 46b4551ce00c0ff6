// src/engine/mod.rs

//! Run-time side of fieldgate.
//!
//! This module ties together:
//! - the per-run [`context`] shared by every task (graph, registry, gates,
//!   notifiers, trace, warnings, cancellation)
//! - the pure [`launch`] plan deciding launch order
//! - the per-field task ([`field_task`]) and the per-edge dependency driver
//!   ([`driver`])
//! - the async [`runtime`] shell that launches everything, drains the
//!   deferred queue and shuts the run down
//! - the [`report`] handed back to the caller
//!
//! The launch plan is synchronous and deterministic so it can be tested
//! without Tokio; everything with timing lives in the runtime.

use std::time::Duration;

use crate::types::ResolutionOrder;

/// Canonical field name type used throughout the crate.
pub type FieldName = String;

/// Timing and policy knobs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorSettings {
    /// Bound on a field's wait for its readiness gate.
    pub gate_timeout: Duration,
    /// Bound on a driver's wait for its parent's completion signal.
    pub notifier_timeout: Duration,
    /// Delay between consecutive launches.
    pub stagger: Duration,
    /// Time every other field gets before the terminal field launches.
    pub grace_period: Duration,
    /// Time in-flight tasks get at shutdown before being cancelled.
    pub shutdown_grace: Duration,
    pub terminal_field: Option<FieldName>,
    pub resolution_order: ResolutionOrder,
    /// Shuffle standalone launches with this seed.
    pub shuffle_seed: Option<u64>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        crate::config::ConfigSection::default().settings()
    }
}

pub mod context;
pub mod driver;
pub mod field_task;
pub mod launch;
pub mod report;
pub mod runtime;
pub mod trace;

pub use context::RunContext;
pub use launch::LaunchPlan;
pub use report::{FieldOutcome, RunReport};
pub use runtime::Executor;
pub use trace::{ExecutionTrace, TraceEvent, TraceEventKind};
