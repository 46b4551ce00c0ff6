// src/engine/report.rs

//! Run Result handed back to the caller after shutdown.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::dag::{FieldState, FieldStatus};
use crate::engine::trace::{TraceEvent, TraceEventKind};
use crate::engine::{FieldName, RunContext};
use crate::errors::FieldError;

/// Final state of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOutcome {
    /// `Interrupted` for cancelled fields, otherwise the last status.
    pub status: FieldStatus,
    /// Status the registry held when the run ended.
    pub last_status: FieldStatus,
    pub resolved_ancestors: Vec<FieldName>,
    pub value: Option<String>,
    pub error: Option<String>,
    pub degraded: bool,
    pub interrupted: bool,
}

impl FieldOutcome {
    fn from_state(state: FieldState) -> Self {
        let status = if state.interrupted {
            FieldStatus::Interrupted
        } else {
            state.status
        };
        Self {
            status,
            last_status: state.status,
            resolved_ancestors: state.resolved_ancestors,
            value: state.value,
            error: state.error,
            degraded: state.degraded,
            interrupted: state.interrupted,
        }
    }

    /// A field that never got a task.
    fn never_started() -> Self {
        Self {
            status: FieldStatus::Pending,
            last_status: FieldStatus::Pending,
            resolved_ancestors: Vec::new(),
            value: None,
            error: None,
            degraded: false,
            interrupted: false,
        }
    }

    /// Completed with every parent confirmed.
    pub fn is_clean(&self) -> bool {
        self.status == FieldStatus::Completed && !self.degraded
    }

    /// Completed, but after a gate timeout or downstream of a degraded parent.
    pub fn is_degraded(&self) -> bool {
        self.status == FieldStatus::Completed && self.degraded
    }

    /// Never reached Completed.
    pub fn is_unresolved(&self) -> bool {
        self.status != FieldStatus::Completed
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub fields: BTreeMap<FieldName, FieldOutcome>,
    pub warnings: Vec<FieldError>,
    pub trace: Vec<TraceEvent>,
    pub elapsed: Duration,
}

impl RunReport {
    /// Collect the final state of every field in the graph.
    pub fn collect(ctx: &RunContext) -> Self {
        let mut states = ctx.registry.snapshot_all();
        let mut fields: BTreeMap<FieldName, FieldOutcome> = ctx
            .graph
            .fields()
            .map(|name| {
                let outcome = states
                    .remove(name)
                    .map(FieldOutcome::from_state)
                    .unwrap_or_else(FieldOutcome::never_started);
                (name.to_string(), outcome)
            })
            .collect();
        // Anything registered outside the graph (should not happen) still shows.
        for (name, state) in states {
            fields.insert(name, FieldOutcome::from_state(state));
        }

        Self {
            fields,
            warnings: ctx.warnings(),
            trace: ctx.trace.events(),
            elapsed: ctx.trace.elapsed(),
        }
    }

    pub fn outcome(&self, field: &str) -> Option<&FieldOutcome> {
        self.fields.get(field)
    }

    pub fn status_of(&self, field: &str) -> Option<FieldStatus> {
        self.outcome(field).map(|o| o.status)
    }

    /// Every field completed cleanly and nothing was flagged.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.fields.values().all(FieldOutcome::is_clean)
    }

    pub fn degraded_fields(&self) -> Vec<&str> {
        self.filter_fields(FieldOutcome::is_degraded)
    }

    pub fn unresolved_fields(&self) -> Vec<&str> {
        self.filter_fields(FieldOutcome::is_unresolved)
    }

    /// Events recorded against `field`, in order.
    pub fn events_for<'a, 'f>(
        &'a self,
        field: &'f str,
    ) -> impl Iterator<Item = &'a TraceEvent> + use<'a, 'f> {
        self.trace.iter().filter(move |e| e.field == field)
    }

    /// First event for `field` matching `pred`.
    pub fn first_event(
        &self,
        field: &str,
        pred: impl Fn(&TraceEventKind) -> bool,
    ) -> Option<&TraceEvent> {
        self.trace
            .iter()
            .find(|e| e.field == field && pred(&e.kind))
    }

    pub fn started_event(&self, field: &str) -> Option<&TraceEvent> {
        self.first_event(field, |k| matches!(k, TraceEventKind::Started))
    }

    pub fn completed_event(&self, field: &str) -> Option<&TraceEvent> {
        self.first_event(field, |k| matches!(k, TraceEventKind::Completed { .. }))
    }

    fn filter_fields(&self, pred: impl Fn(&FieldOutcome) -> bool) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, o)| pred(o))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
