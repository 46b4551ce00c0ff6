#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use fieldgate::dag::DependencyGraph;
use fieldgate::engine::{Executor, ExecutorSettings, RunReport, TraceEventKind};
use fieldgate::errors::FieldError;
use fieldgate::resolve::FieldResolver;

pub use fieldgate_test_utils::builders;
pub use fieldgate_test_utils::fake_resolver;
pub use fieldgate_test_utils::{init_tracing, with_timeout};

/// Run `graph` to completion with the given resolver and settings.
pub async fn run_graph(
    graph: DependencyGraph,
    resolver: Arc<dyn FieldResolver>,
    settings: ExecutorSettings,
) -> RunReport {
    with_timeout(Executor::new(graph, resolver, settings).run()).await
}

/// Assert that every `(child, parent)` edge whose both ends completed has the
/// parent's `Completed` event recorded before the child's.
pub fn assert_causal_order(report: &RunReport, graph: &DependencyGraph) {
    for (child, parent) in graph.edges() {
        let (Some(c), Some(p)) = (report.completed_event(child), report.completed_event(parent))
        else {
            continue;
        };
        assert!(
            p.seq < c.seq,
            "{child} completed (seq {}) before its parent {parent} (seq {})",
            c.seq,
            p.seq
        );
    }
}

/// Assert that ancestor lists hold no duplicates, never name the field
/// itself, and still hold every parent a driver confirmed during the run.
pub fn assert_ancestors_well_formed(report: &RunReport) {
    for event in report.trace.iter() {
        if let TraceEventKind::ParentResolved { parent, .. } = &event.kind {
            let kept = report
                .outcome(&event.field)
                .is_some_and(|o| o.resolved_ancestors.contains(parent));
            assert!(
                kept,
                "{} confirmed parent {parent} (seq {}) but it is missing from the final ancestors",
                event.field,
                event.seq
            );
        }
    }

    for (name, outcome) in report.fields.iter() {
        let unique: BTreeSet<&String> = outcome.resolved_ancestors.iter().collect();
        assert_eq!(
            unique.len(),
            outcome.resolved_ancestors.len(),
            "duplicate ancestors for {name}: {:?}",
            outcome.resolved_ancestors
        );
        assert!(
            !outcome.resolved_ancestors.contains(name),
            "{name} lists itself as an ancestor"
        );
    }
}

pub fn ancestors(report: &RunReport, field: &str) -> BTreeSet<String> {
    report
        .outcome(field)
        .map(|o| o.resolved_ancestors.iter().cloned().collect())
        .unwrap_or_default()
}

pub fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn warnings_for<'a>(report: &'a RunReport, field: &str) -> Vec<&'a FieldError> {
    report.warnings.iter().filter(|w| w.field() == field).collect()
}
