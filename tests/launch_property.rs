mod common;
use crate::common::builders::relaxed_settings;
use crate::common::fake_resolver::ScriptedResolver;

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;

use fieldgate::dag::{DependencyGraph, FieldStatus};
use fieldgate::engine::{Executor, ExecutorSettings, LaunchPlan};

// Acyclic by construction: field N may only depend on fields 0..N-1.
fn dag_strategy(max_fields: usize) -> impl Strategy<Value = DependencyGraph> {
    (1..=max_fields).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), n).prop_map(
            move |raw| {
                DependencyGraph::from_parents(raw.into_iter().enumerate().map(|(i, picks)| {
                    let parents: BTreeSet<String> = if i == 0 {
                        BTreeSet::new()
                    } else {
                        picks.into_iter().map(|p| format!("f{}", p % i)).collect()
                    };
                    (format!("f{i}"), parents.into_iter().collect())
                }))
            },
        )
    })
}

proptest! {
    #[test]
    fn launch_order_covers_every_field_once(
        g in dag_strategy(20),
        seed in proptest::option::of(any::<u64>()),
        terminal_pick in any::<usize>(),
    ) {
        let fields: Vec<&str> = g.fields().collect();
        let terminal = fields[terminal_pick % fields.len()];
        let plan = LaunchPlan::new(&g, Some(terminal), seed);

        let order: Vec<&str> = plan.launch_order().collect();
        prop_assert_eq!(order.len(), g.len());
        let unique: BTreeSet<&str> = order.iter().copied().collect();
        prop_assert_eq!(unique.len(), g.len());
        prop_assert_eq!(order.last().copied(), Some(terminal));

        // High fan-in first, most parents first.
        let counts: Vec<usize> = plan.high_fan_in().iter().map(|f| g.parents_of(f).len()).collect();
        prop_assert!(counts.windows(2).all(|w| w[0] >= w[1]));
        prop_assert!(counts.iter().all(|c| *c > 0));
        prop_assert!(plan.standalone().iter().all(|f| g.parents_of(f).is_empty()));
    }

    #[test]
    fn shuffle_seed_only_permutes_standalone_fields(
        g in dag_strategy(20),
        a in any::<u64>(),
        b in any::<u64>(),
    ) {
        let pa = LaunchPlan::new(&g, None, Some(a));
        let pb = LaunchPlan::new(&g, None, Some(b));

        prop_assert_eq!(pa.high_fan_in(), pb.high_fan_in());
        let sa: BTreeSet<&String> = pa.standalone().iter().collect();
        let sb: BTreeSet<&String> = pb.standalone().iter().collect();
        prop_assert_eq!(sa, sb);

        let edges_a = pa.driver_edges(&g);
        let edges_b = pb.driver_edges(&g);
        prop_assert_eq!(edges_a.len(), g.edges().count());
        prop_assert_eq!(edges_a, edges_b);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn any_acyclic_graph_completes_regardless_of_launch_shuffle(
        g in dag_strategy(12),
        seed in any::<u64>(),
    ) {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        let settings = ExecutorSettings {
            shuffle_seed: Some(seed),
            ..relaxed_settings()
        };
        let resolver = Arc::new(ScriptedResolver::new().with_jitter(3, seed));
        let report = rt.block_on(Executor::new(g.clone(), resolver, settings).run());

        prop_assert!(report.is_clean(), "warnings: {:?}", report.warnings);
        for name in g.fields() {
            prop_assert_eq!(report.status_of(name), Some(FieldStatus::Completed));
        }
    }
}
