// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod resolve;
pub mod sync;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::RecordConfig;
use crate::dag::DependencyGraph;
use crate::engine::{Executor, LaunchPlan, RunReport};
use crate::resolve::AllowedValuesResolver;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (+ CLI overrides)
/// - the built-in allowed-value resolver
/// - the executor
/// - Ctrl-C handling
/// - printing the run report
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;

    if let Some(policy) = args.cycle_policy {
        cfg.config.cycle_policy = policy;
    }
    if let Some(order) = args.resolution_order {
        cfg.config.resolution_order = order;
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let resolver = Arc::new(AllowedValuesResolver::from_config(&cfg));
    let executor = Executor::from_config(&cfg, resolver)?;

    // Ctrl-C → cancel the run; tasks mark themselves interrupted.
    {
        let cancel = executor.cancel_handle();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; cancelling run");
            cancel.send_replace(true);
        });
    }

    let report = executor.run().await;
    print_report(&report);
    Ok(())
}

/// Dry-run output: fields, parents, values and the launch plan.
fn print_dry_run(cfg: &RecordConfig) {
    let settings = cfg.settings();
    println!("fieldgate dry-run");
    println!("  config.gate_timeout = {:?}", settings.gate_timeout);
    println!("  config.notifier_timeout = {:?}", settings.notifier_timeout);
    println!("  config.stagger = {:?}", settings.stagger);
    println!("  config.cycle_policy = {:?}", cfg.config.cycle_policy);
    println!("  config.resolution_order = {:?}", settings.resolution_order);
    println!();

    println!("fields ({}):", cfg.field.len());
    for (name, field) in cfg.field.iter() {
        println!("  - {name}");
        if !field.after.is_empty() {
            println!("      after: {:?}", field.after);
        }
        if !field.values.is_empty() {
            println!("      values: {:?}", field.values);
        }
        if let Some(ref default) = field.default {
            println!("      default: {default}");
        }
    }

    let graph = DependencyGraph::from_rules(cfg);
    if let Some(node) = graph.find_cycle() {
        println!();
        println!("warning: cycle through field '{node}' (fields on it will degrade via timeouts)");
    }

    let plan = LaunchPlan::new(&graph, settings.terminal_field.as_deref(), settings.shuffle_seed);
    println!();
    println!("launch order:");
    for (i, field) in plan.launch_order().enumerate() {
        println!("  {:>3}. {field}", i + 1);
    }
    println!();
    println!("dependency drivers: {}", plan.driver_edges(&graph).len());

    debug!("dry-run complete (nothing resolved)");
}

fn print_report(report: &RunReport) {
    println!("fieldgate run finished in {:?}", report.elapsed);
    for (name, outcome) in report.fields.iter() {
        let value = outcome.value.as_deref().unwrap_or("-");
        let mut flags = Vec::new();
        if outcome.degraded {
            flags.push("degraded");
        }
        if outcome.interrupted {
            flags.push("interrupted");
        }
        println!(
            "  {name}: {:?} = {value}{}",
            outcome.status,
            if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            }
        );
        if !outcome.resolved_ancestors.is_empty() {
            println!("      ancestors: {:?}", outcome.resolved_ancestors);
        }
        if let Some(ref err) = outcome.error {
            println!("      error: {err}");
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("warnings ({}):", report.warnings.len());
        for w in report.warnings.iter() {
            println!("  - {w}");
        }
    }
}
