// src/dag/graph.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::RecordConfig;
use crate::engine::FieldName;
use crate::errors::{FieldgateError, Result};
use crate::types::CyclePolicy;

/// Supplies the field list of a record type and each field's declared parents.
///
/// Read once, when the [`DependencyGraph`] is built.
pub trait RuleSource {
    /// Every field name of the record type.
    fn field_names(&self) -> Vec<FieldName>;

    /// Declared parents of `field` (may name fields that do not exist).
    fn parents_of(&self, field: &str) -> Vec<FieldName>;
}

impl RuleSource for RecordConfig {
    fn field_names(&self) -> Vec<FieldName> {
        self.field.keys().cloned().collect()
    }

    fn parents_of(&self, field: &str) -> Vec<FieldName> {
        self.field
            .get(field)
            .map(|f| f.after.clone())
            .unwrap_or_default()
    }
}

/// Internal node structure: stores immediate parents and dependents.
#[derive(Debug, Clone, Default)]
struct FieldNode {
    /// Declared parents, deduplicated, in declaration order.
    parents: Vec<FieldName>,
    /// Fields that list this one as a parent.
    dependents: Vec<FieldName>,
}

/// Read-only mapping from field name to its parents (and dependents).
///
/// Built once per run and shared behind an `Arc`; it never mutates after
/// construction. No acyclicity check is made unless asked for via
/// [`CyclePolicy::Reject`].
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: BTreeMap<FieldName, FieldNode>,
}

impl DependencyGraph {
    /// Build from `(field, declared parents)` pairs.
    ///
    /// Parents that are not themselves listed as fields are kept on the
    /// child; they simply never get a node of their own.
    pub fn from_parents<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (FieldName, Vec<FieldName>)>,
    {
        let mut nodes: BTreeMap<FieldName, FieldNode> = BTreeMap::new();

        // First pass: create nodes with their parent lists.
        for (name, declared) in fields {
            let mut parents: Vec<FieldName> = Vec::with_capacity(declared.len());
            for p in declared {
                if !parents.contains(&p) {
                    parents.push(p);
                }
            }
            nodes.entry(name).or_default().parents = parents;
        }

        // Second pass: populate dependents.
        let edges: Vec<(FieldName, FieldName)> = nodes
            .iter()
            .flat_map(|(child, node)| {
                node.parents
                    .iter()
                    .map(move |p| (child.clone(), p.clone()))
            })
            .collect();

        for (child, parent) in edges {
            if let Some(parent_node) = nodes.get_mut(&parent) {
                parent_node.dependents.push(child);
            }
        }

        Self { nodes }
    }

    /// Build from a [`RuleSource`] without any cycle check.
    pub fn from_rules(source: &impl RuleSource) -> Self {
        Self::from_parents(
            source
                .field_names()
                .into_iter()
                .map(|name| {
                    let parents = source.parents_of(&name);
                    (name, parents)
                }),
        )
    }

    /// Build from a [`RuleSource`], rejecting cycles when the policy says so.
    pub fn from_rules_with_policy(source: &impl RuleSource, policy: CyclePolicy) -> Result<Self> {
        let graph = Self::from_rules(source);
        if policy == CyclePolicy::Reject {
            graph.ensure_acyclic()?;
        }
        Ok(graph)
    }

    /// All field names, in name order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Declared parents of a field.
    pub fn parents_of(&self, name: &str) -> &[FieldName] {
        self.nodes
            .get(name)
            .map(|n| n.parents.as_slice())
            .unwrap_or(&[])
    }

    /// Fields that declare `name` as a parent.
    pub fn dependents_of(&self, name: &str) -> &[FieldName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_dependents(&self, name: &str) -> bool {
        !self.dependents_of(name).is_empty()
    }

    /// Every `(child, parent)` edge, including edges to unknown parents.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes.iter().flat_map(|(child, node)| {
            node.parents
                .iter()
                .map(move |p| (child.as_str(), p.as_str()))
        })
    }

    /// Some field that sits on a cycle, if the graph has one.
    pub fn find_cycle(&self) -> Option<FieldName> {
        // Edge direction: parent -> child.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for name in self.nodes.keys() {
            graph.add_node(name.as_str());
        }
        for (child, parent) in self.edges() {
            if self.contains(parent) {
                graph.add_edge(parent, child, ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => None,
            Err(cycle) => Some(cycle.node_id().to_string()),
        }
    }

    pub fn ensure_acyclic(&self) -> Result<()> {
        match self.find_cycle() {
            None => Ok(()),
            Some(node) => Err(FieldgateError::DagCycle(format!(
                "cycle detected in dependency graph involving field '{}'",
                node
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(layout: &[(&str, &[&str])]) -> DependencyGraph {
        DependencyGraph::from_parents(layout.iter().map(|(name, parents)| {
            (
                name.to_string(),
                parents.iter().map(|p| p.to_string()).collect(),
            )
        }))
    }

    #[test]
    fn dependents_are_derived_from_parents() {
        let g = graph(&[("A", &[]), ("B", &["A"]), ("C", &["A", "B"])]);

        assert_eq!(g.parents_of("C"), &["A".to_string(), "B".to_string()]);
        assert_eq!(g.dependents_of("A"), &["B".to_string(), "C".to_string()]);
        assert!(g.has_dependents("B"));
        assert!(!g.has_dependents("C"));
        assert_eq!(g.edges().count(), 3);
    }

    #[test]
    fn duplicate_parents_are_collapsed() {
        let g = graph(&[("A", &[]), ("B", &["A", "A"])]);
        assert_eq!(g.parents_of("B").len(), 1);
        assert_eq!(g.dependents_of("A").len(), 1);
    }

    #[test]
    fn unknown_parents_are_kept_on_the_child() {
        let g = graph(&[("B", &["ghost"])]);
        assert_eq!(g.parents_of("B"), &["ghost".to_string()]);
        assert!(!g.contains("ghost"));
        assert!(g.find_cycle().is_none());
    }

    #[test]
    fn cycles_are_found_but_only_rejected_on_request() {
        let g = graph(&[("X", &["Y"]), ("Y", &["X"])]);
        let node = g.find_cycle().expect("cycle should be reported");
        assert!(node == "X" || node == "Y");

        match g.ensure_acyclic() {
            Err(FieldgateError::DagCycle(msg)) => assert!(msg.contains("cycle detected")),
            other => panic!("expected DagCycle, got {other:?}"),
        }
    }
}
