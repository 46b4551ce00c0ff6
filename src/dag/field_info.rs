// src/dag/field_info.rs

//! Per-field lifecycle state held by the [`FieldRegistry`](super::FieldRegistry).

use std::collections::BTreeMap;

use crate::engine::FieldName;

/// Lifecycle status of a field within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldStatus {
    /// No task has registered the field yet.
    Pending,
    /// The field's task is running its own resolution work.
    Running,
    /// Resolution is done (or deferred); blocked on the readiness gate.
    WaitingOnParents,
    /// Finished. May still be degraded, see [`FieldState::degraded`].
    Completed,
    /// The resolver returned an error for this field.
    Failed,
    /// The task was cancelled before it finished.
    Interrupted,
}

impl FieldStatus {
    /// Whether the field reached an end state that releases its dependents.
    pub fn is_finished(self) -> bool {
        matches!(self, FieldStatus::Completed | FieldStatus::Failed)
    }
}

/// Everything the registry knows about one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldState {
    pub name: FieldName,
    pub status: FieldStatus,
    /// Parents confirmed so far, plus their own recorded ancestors.
    ///
    /// Deduplicated, append-only.
    pub resolved_ancestors: Vec<FieldName>,
    pub interrupted: bool,
    /// Value produced by the resolver, once it succeeded.
    pub value: Option<String>,
    /// Resolver error message, if it failed.
    pub error: Option<String>,
    /// Completed after a gate timeout, or after a parent that was itself
    /// degraded.
    pub degraded: bool,
}

impl FieldState {
    pub fn new(name: FieldName) -> Self {
        Self {
            name,
            status: FieldStatus::Running,
            resolved_ancestors: Vec::new(),
            interrupted: false,
            value: None,
            error: None,
            degraded: false,
        }
    }

    /// Append names that are not recorded yet, keeping order.
    ///
    /// Returns the names that were actually added.
    pub(crate) fn append_ancestors<I>(&mut self, names: I) -> Vec<FieldName>
    where
        I: IntoIterator<Item = FieldName>,
    {
        let mut added = Vec::new();
        for name in names {
            if name != self.name && !self.resolved_ancestors.contains(&name) {
                self.resolved_ancestors.push(name.clone());
                added.push(name);
            }
        }
        added
    }
}

/// Values of the fields that have resolved so far, as handed to a resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSnapshot {
    values: BTreeMap<FieldName, String>,
}

impl RecordSnapshot {
    pub fn new(values: BTreeMap<FieldName, String>) -> Self {
        Self { values }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
