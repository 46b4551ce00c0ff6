// src/dag/registry.rs

//! Field State Registry: the only mutable shared table in a run.
//!
//! Tasks never touch the underlying map; every read/modify/write goes
//! through a method here, and each method holds at most one entry guard at
//! a time. That last point matters with `DashMap`: holding a guard on one
//! entry while locking another in the same shard deadlocks.

use std::collections::BTreeMap;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, warn};

use crate::dag::field_info::{FieldState, FieldStatus, RecordSnapshot};
use crate::engine::FieldName;

#[derive(Debug, Default)]
pub struct FieldRegistry {
    fields: DashMap<FieldName, FieldState>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the entry for `field` with status `Running`.
    ///
    /// Returns `false` (and leaves the existing entry alone) if the field was
    /// already registered.
    pub fn register(&self, field: &str) -> bool {
        match self.fields.entry(field.to_string()) {
            Entry::Occupied(_) => {
                warn!(field = %field, "field registered twice; keeping first entry");
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(FieldState::new(field.to_string()));
                debug!(field = %field, "registered field");
                true
            }
        }
    }

    pub fn is_registered(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn status_of(&self, field: &str) -> Option<FieldStatus> {
        self.fields.get(field).map(|s| s.status)
    }

    /// Whether `field` is Completed or Failed.
    pub fn is_finished(&self, field: &str) -> bool {
        self.status_of(field).is_some_and(FieldStatus::is_finished)
    }

    /// Move a registered field to `status`. Returns `false` if unknown.
    pub fn set_status(&self, field: &str, status: FieldStatus) -> bool {
        match self.fields.get_mut(field) {
            Some(mut state) => {
                state.status = status;
                true
            }
            None => {
                warn!(field = %field, ?status, "status update for unregistered field; ignoring");
                false
            }
        }
    }

    /// Store the resolver output without changing status.
    pub fn set_value(&self, field: &str, value: String) {
        if let Some(mut state) = self.fields.get_mut(field) {
            state.value = Some(value);
        }
    }

    /// Mark `field` Completed. `degraded` is sticky: a field already marked
    /// degraded by a parent stays degraded.
    pub fn complete(&self, field: &str, degraded: bool) {
        if let Some(mut state) = self.fields.get_mut(field) {
            state.status = FieldStatus::Completed;
            state.degraded |= degraded;
        }
    }

    pub fn is_degraded(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(|s| s.degraded)
    }

    /// Flag `field` as degraded ahead of completion, e.g. because a parent
    /// only completed after its own gate timed out.
    pub fn mark_degraded(&self, field: &str) {
        if let Some(mut state) = self.fields.get_mut(field) {
            state.degraded = true;
        }
    }

    pub fn fail(&self, field: &str, message: String) {
        if let Some(mut state) = self.fields.get_mut(field) {
            state.status = FieldStatus::Failed;
            state.error = Some(message);
        }
    }

    /// Flag a cancelled task. The last recorded status is kept; a field that
    /// was cancelled before it registered is recorded as `Pending`.
    pub fn mark_interrupted(&self, field: &str) {
        let mut state = self.fields.entry(field.to_string()).or_insert_with(|| {
            let mut state = FieldState::new(field.to_string());
            state.status = FieldStatus::Pending;
            state
        });
        state.interrupted = true;
    }

    /// Record `parent` (and whatever `parent` has already resolved) against
    /// `child`'s ancestor list.
    ///
    /// Returns the names newly appended.
    pub fn record_ancestors(&self, child: &str, parent: &str) -> Vec<FieldName> {
        // Read the parent first and drop its guard before touching the child.
        let inherited: Vec<FieldName> = self
            .fields
            .get(parent)
            .map(|p| p.resolved_ancestors.clone())
            .unwrap_or_default();

        let mut names = Vec::with_capacity(inherited.len() + 1);
        names.push(parent.to_string());
        names.extend(inherited);

        match self.fields.get_mut(child) {
            Some(mut state) => state.append_ancestors(names),
            None => {
                warn!(child = %child, parent = %parent, "ancestor update for unregistered field");
                Vec::new()
            }
        }
    }

    pub fn ancestors_of(&self, field: &str) -> Vec<FieldName> {
        self.fields
            .get(field)
            .map(|s| s.resolved_ancestors.clone())
            .unwrap_or_default()
    }

    pub fn state_of(&self, field: &str) -> Option<FieldState> {
        self.fields.get(field).map(|s| s.value().clone())
    }

    /// Values of every field that has produced one so far.
    pub fn record_snapshot(&self) -> RecordSnapshot {
        let values = self
            .fields
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .value
                    .as_ref()
                    .map(|v| (entry.key().clone(), v.clone()))
            })
            .collect();
        RecordSnapshot::new(values)
    }

    /// Clone of every registered entry, keyed by name.
    pub fn snapshot_all(&self) -> BTreeMap<FieldName, FieldState> {
        self.fields
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}
