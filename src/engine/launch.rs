// src/engine/launch.rs

//! Launch policy: which fields start in which order.
//!
//! Pure and synchronous. The async runtime walks the plan and adds the
//! timing (stagger, grace period, deferral).

use tracing::{debug, warn};

use crate::dag::DependencyGraph;
use crate::engine::FieldName;

/// Launch order for one run.
///
/// 1. `high_fan_in`: fields that declare parents, most parents first
///    (ties by name).
/// 2. `standalone`: fields without parents, in name order or shuffled by
///    a seed.
/// 3. `terminal`: the designated terminal field, launched last whatever its
///    parents are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    high_fan_in: Vec<FieldName>,
    standalone: Vec<FieldName>,
    terminal: Option<FieldName>,
}

impl LaunchPlan {
    pub fn new(graph: &DependencyGraph, terminal: Option<&str>, shuffle_seed: Option<u64>) -> Self {
        let terminal = match terminal {
            Some(t) if graph.contains(t) => Some(t.to_string()),
            Some(t) => {
                warn!(field = %t, "terminal field is not part of the graph; ignoring");
                None
            }
            None => None,
        };

        let (mut high_fan_in, mut standalone): (Vec<FieldName>, Vec<FieldName>) = graph
            .fields()
            .filter(|name| terminal.as_deref() != Some(*name))
            .map(|name| name.to_string())
            .partition(|name| !graph.parents_of(name).is_empty());

        high_fan_in.sort_by(|a, b| {
            graph
                .parents_of(b)
                .len()
                .cmp(&graph.parents_of(a).len())
                .then_with(|| a.cmp(b))
        });

        if let Some(seed) = shuffle_seed {
            fastrand::Rng::with_seed(seed).shuffle(&mut standalone);
        }

        debug!(
            ?high_fan_in,
            ?standalone,
            ?terminal,
            "launch plan built"
        );

        Self {
            high_fan_in,
            standalone,
            terminal,
        }
    }

    pub fn high_fan_in(&self) -> &[FieldName] {
        &self.high_fan_in
    }

    pub fn standalone(&self) -> &[FieldName] {
        &self.standalone
    }

    pub fn terminal(&self) -> Option<&str> {
        self.terminal.as_deref()
    }

    /// Every field in launch order, terminal last.
    pub fn launch_order(&self) -> impl Iterator<Item = &str> {
        self.high_fan_in
            .iter()
            .chain(self.standalone.iter())
            .chain(self.terminal.iter())
            .map(|s| s.as_str())
    }

    /// `(child, parent)` pairs for every launched field, in launch order.
    pub fn driver_edges(&self, graph: &DependencyGraph) -> Vec<(FieldName, FieldName)> {
        self.launch_order()
            .flat_map(|child| edges_of(graph, child))
            .collect()
    }
}

/// `(child, parent)` pairs for one child; one driver is spawned per pair.
pub fn edges_of(graph: &DependencyGraph, child: &str) -> Vec<(FieldName, FieldName)> {
    graph
        .parents_of(child)
        .iter()
        .map(|parent| (child.to_string(), parent.clone()))
        .collect()
}
