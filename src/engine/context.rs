// src/engine/context.rs

//! Per-run state shared by every field task and dependency driver.
//!
//! One [`RunContext`] is created per run and handed to each task behind an
//! `Arc`. Nothing here is process-wide.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::warn;

use crate::dag::{DependencyGraph, FieldRegistry};
use crate::engine::trace::{ExecutionTrace, TraceEventKind};
use crate::engine::{ExecutorSettings, FieldName};
use crate::errors::FieldError;
use crate::resolve::FieldResolver;
use crate::sync::{NotifierSet, ReadinessGate};

pub struct RunContext {
    pub graph: Arc<DependencyGraph>,
    pub registry: FieldRegistry,
    pub notifiers: NotifierSet,
    pub trace: ExecutionTrace,
    pub settings: ExecutorSettings,
    pub resolver: Arc<dyn FieldResolver>,
    gates: DashMap<FieldName, Arc<ReadinessGate>>,
    warnings: Mutex<Vec<FieldError>>,
    cancel_rx: watch::Receiver<bool>,
    settled: watch::Sender<bool>,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("fields", &self.graph.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl RunContext {
    pub fn new(
        graph: Arc<DependencyGraph>,
        resolver: Arc<dyn FieldResolver>,
        settings: ExecutorSettings,
        cancel_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            graph,
            registry: FieldRegistry::new(),
            notifiers: NotifierSet::new(),
            trace: ExecutionTrace::new(),
            settings,
            resolver,
            gates: DashMap::new(),
            warnings: Mutex::new(Vec::new()),
            cancel_rx,
            settled: watch::channel(false).0,
        }
    }

    /// Create the readiness gate for `field` if it declares parents.
    ///
    /// Called by the field's own task before it registers, so a registered
    /// field with parents always has its gate in place.
    pub fn arm_gate(&self, field: &str) -> Option<Arc<ReadinessGate>> {
        let gate = ReadinessGate::new(field, self.graph.parents_of(field))?;
        let gate = self
            .gates
            .entry(field.to_string())
            .or_insert_with(|| Arc::new(gate))
            .value()
            .clone();
        Some(gate)
    }

    pub fn gate_of(&self, field: &str) -> Option<Arc<ReadinessGate>> {
        self.gates.get(field).map(|g| Arc::clone(g.value()))
    }

    /// Whether a driver for `(child, parent)` can be spawned right now.
    pub fn driver_ready(&self, child: &str, parent: &str) -> bool {
        self.registry.is_registered(child)
            && self.gates.contains_key(child)
            && self.graph.contains(parent)
    }

    pub fn record_warning(&self, warning: FieldError) {
        self.warnings.lock().push(warning);
    }

    pub fn warnings(&self) -> Vec<FieldError> {
        self.warnings.lock().clone()
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Resolves once the run is cancelled. Never resolves if the run's
    /// cancel sender is gone without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel_rx.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }

    /// Called once the scheduler has launched every field it is going to.
    pub fn mark_launch_settled(&self) {
        self.settled.send_replace(true);
    }

    /// Resolves once every field has been launched.
    ///
    /// Gate and notifier timeouts count from here (or from the start of the
    /// wait, if later), so a parent that simply has not been launched yet
    /// never eats into a child's budget.
    pub async fn launch_settled(&self) {
        let mut rx = self.settled.subscribe();
        let closed = rx.wait_for(|settled| *settled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }

    /// Flag `field` as interrupted and note it in the trace and warnings.
    pub fn interrupt(&self, field: &str) {
        warn!(field = %field, "field task interrupted");
        self.registry.mark_interrupted(field);
        self.trace.record(field, TraceEventKind::Interrupted);
        self.record_warning(FieldError::Interrupted {
            field: field.to_string(),
        });
    }
}
