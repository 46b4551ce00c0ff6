mod common;
use crate::common::builders::relaxed_settings;
use crate::common::fake_resolver::ScriptedResolver;
use crate::common::{assert_ancestors_well_formed, assert_causal_order, init_tracing, run_graph};

use std::collections::BTreeSet;
use std::sync::Arc;

use fieldgate::dag::{DependencyGraph, FieldStatus};
use fieldgate::engine::ExecutorSettings;
use fieldgate::types::ResolutionOrder;

/// Random acyclic graph: field `i` may only depend on fields `0..i`.
fn random_dag(fields: usize, max_parents: usize, seed: u64) -> DependencyGraph {
    let mut rng = fastrand::Rng::with_seed(seed);
    DependencyGraph::from_parents((0..fields).map(|i| {
        let mut parents = BTreeSet::new();
        if i > 0 {
            for _ in 0..rng.usize(0..=max_parents) {
                parents.insert(format!("f{:02}", rng.usize(0..i)));
            }
        }
        (format!("f{i:02}"), parents.into_iter().collect())
    }))
}

async fn assert_clean_run(g: DependencyGraph, settings: ExecutorSettings, seed: u64) {
    let resolver = ScriptedResolver::new().with_jitter(5, seed);
    let report = run_graph(g.clone(), Arc::new(resolver), settings).await;

    assert!(report.is_clean(), "seed {seed}: warnings {:?}", report.warnings);
    assert_eq!(report.fields.len(), g.len());

    for (name, outcome) in report.fields.iter() {
        assert_eq!(outcome.status, FieldStatus::Completed, "{name}");
        for parent in g.parents_of(name) {
            assert!(
                outcome.resolved_ancestors.contains(parent),
                "seed {seed}: {name} is missing parent {parent} in {:?}",
                outcome.resolved_ancestors
            );
        }
    }
    assert_causal_order(&report, &g);
    assert_ancestors_well_formed(&report);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn sixty_fields_with_random_delays_complete_cleanly() {
    init_tracing();

    for seed in [7, 42, 1234] {
        let g = random_dag(60, 3, seed);
        assert_clean_run(g, relaxed_settings(), seed).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn wide_fan_in_releases_gate_once() {
    init_tracing();

    let mut layout: Vec<(String, Vec<String>)> =
        (0..64).map(|i| (format!("leaf{i:02}"), Vec::new())).collect();
    layout.push((
        "root".to_string(),
        (0..64).map(|i| format!("leaf{i:02}")).collect(),
    ));
    let g = DependencyGraph::from_parents(layout);

    assert_clean_run(g, relaxed_settings(), 99).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn stress_run_with_after_parents_order() {
    init_tracing();

    let settings = ExecutorSettings {
        resolution_order: ResolutionOrder::AfterParents,
        shuffle_seed: Some(5),
        ..relaxed_settings()
    };
    assert_clean_run(random_dag(60, 4, 5), settings, 5).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn sixty_field_chain_completes_cleanly_on_default_settings() {
    init_tracing();

    let g = DependencyGraph::from_parents((0..60).map(|i| {
        let parents = if i == 0 {
            Vec::new()
        } else {
            vec![format!("f{:02}", i - 1)]
        };
        (format!("f{i:02}"), parents)
    }));
    let report = run_graph(
        g.clone(),
        Arc::new(ScriptedResolver::new()),
        ExecutorSettings::default(),
    )
    .await;

    assert!(report.is_clean(), "warnings: {:?}", report.warnings);
    assert!(report.degraded_fields().is_empty());
    let last = report.outcome("f59").unwrap();
    assert_eq!(last.resolved_ancestors.len(), 59);
    assert_causal_order(&report, &g);
    assert_ancestors_well_formed(&report);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn sixty_random_fields_complete_cleanly_on_default_settings() {
    init_tracing();

    for seed in [3, 21] {
        assert_clean_run(random_dag(60, 3, seed), ExecutorSettings::default(), seed).await;
    }
}
