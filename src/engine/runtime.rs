// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::RecordConfig;
use crate::dag::DependencyGraph;
use crate::engine::driver::drive_edge;
use crate::engine::field_task::{run_field, FieldExit};
use crate::engine::launch::{edges_of, LaunchPlan};
use crate::engine::report::RunReport;
use crate::engine::{ExecutorSettings, FieldName, RunContext};
use crate::errors::{FieldError, Result};
use crate::resolve::FieldResolver;

/// How long cancelled tasks get to notice before they are aborted.
const CANCEL_WINDOW: Duration = Duration::from_millis(250);

type Edge = (FieldName, FieldName);

/// Launches one task per field and one driver per dependency edge, then
/// shuts the run down and reports.
///
/// All timing lives here (stagger, grace period, deferral, shutdown); the
/// order itself comes from [`LaunchPlan`].
pub struct Executor {
    ctx: Arc<RunContext>,
    cancel_tx: watch::Sender<bool>,
    fields: Vec<(FieldName, JoinHandle<FieldExit>)>,
    drivers: Vec<JoinHandle<()>>,
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

impl Executor {
    pub fn new(
        graph: DependencyGraph,
        resolver: Arc<dyn FieldResolver>,
        settings: ExecutorSettings,
    ) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let ctx = RunContext::new(Arc::new(graph), resolver, settings, cancel_rx);
        Self {
            ctx: Arc::new(ctx),
            cancel_tx,
            fields: Vec::new(),
            drivers: Vec::new(),
        }
    }

    /// Build the graph from a validated config, honouring its cycle policy.
    pub fn from_config(cfg: &RecordConfig, resolver: Arc<dyn FieldResolver>) -> Result<Self> {
        let graph = DependencyGraph::from_rules_with_policy(cfg, cfg.config.cycle_policy)?;
        Ok(Self::new(graph, resolver, cfg.settings()))
    }

    /// Handle for cancelling the run from outside (e.g. Ctrl-C).
    pub fn cancel_handle(&self) -> watch::Sender<bool> {
        self.cancel_tx.clone()
    }

    /// Run every field and return the final report.
    pub async fn run(mut self) -> RunReport {
        let settings = self.ctx.settings.clone();
        let graph = Arc::clone(&self.ctx.graph);
        let plan = LaunchPlan::new(
            &graph,
            settings.terminal_field.as_deref(),
            settings.shuffle_seed,
        );

        info!(
            fields = graph.len(),
            high_fan_in = plan.high_fan_in().len(),
            standalone = plan.standalone().len(),
            terminal = ?plan.terminal(),
            "run started"
        );

        // Drivers are spawned alongside the launch loop, so a child's drivers
        // exist shortly after the child itself.
        let (edge_tx, edge_rx) = mpsc::unbounded_channel();
        let spawner = tokio::spawn(spawn_drivers(Arc::clone(&self.ctx), edge_rx));

        for field in plan.high_fan_in().iter().chain(plan.standalone()) {
            if self.ctx.is_cancelled() {
                break;
            }
            self.launch_field(field);
            pause(settings.stagger).await;
            queue_edges(&edge_tx, &graph, field);
        }

        if let Some(terminal) = plan.terminal() {
            pause(settings.grace_period).await;
            if !self.ctx.is_cancelled() {
                info!(field = %terminal, "launching terminal field");
                self.launch_field(terminal);
                queue_edges(&edge_tx, &graph, terminal);
            }
        }

        self.ctx.mark_launch_settled();
        drop(edge_tx);
        match spawner.await {
            Ok(drivers) => self.drivers = drivers,
            Err(err) => warn!(error = %err, "driver spawner panicked"),
        }

        self.shutdown().await;

        let report = RunReport::collect(&self.ctx);
        info!(
            elapsed = ?report.elapsed,
            warnings = report.warnings.len(),
            unresolved = report.unresolved_fields().len(),
            "run finished"
        );
        report
    }

    fn launch_field(&mut self, field: &str) {
        debug!(field = %field, "launching field task");
        let handle = tokio::spawn(run_field(Arc::clone(&self.ctx), field.to_string()));
        self.fields.push((field.to_string(), handle));
    }

    /// Wait for in-flight tasks up to the shutdown grace window, then cancel
    /// whatever is left.
    async fn shutdown(&mut self) {
        let grace = self.ctx.settings.shutdown_grace;
        let drained = timeout(grace, join_all(&mut self.fields, &mut self.drivers)).await;

        if drained.is_ok() {
            debug!("all tasks finished within the shutdown grace window");
            return;
        }

        let remaining = self.fields.iter().filter(|(_, h)| !h.is_finished()).count();
        warn!(
            remaining,
            waited = ?grace,
            "shutdown grace window elapsed; cancelling remaining tasks"
        );
        self.cancel_tx.send_replace(true);

        if timeout(CANCEL_WINDOW, join_all(&mut self.fields, &mut self.drivers))
            .await
            .is_err()
        {
            for (field, handle) in self.fields.iter() {
                if !handle.is_finished() {
                    handle.abort();
                    self.ctx.interrupt(field);
                }
            }
            for handle in self.drivers.iter() {
                handle.abort();
            }
        }
    }
}

fn queue_edges(tx: &mpsc::UnboundedSender<Edge>, graph: &DependencyGraph, child: &str) {
    for edge in edges_of(graph, child) {
        // The spawner only stops after the sender is dropped.
        let _ = tx.send(edge);
    }
}

/// Spawn one driver per incoming edge until the launch loop is done.
///
/// An edge whose child is not registered yet (or whose parent is unknown)
/// is deferred once and retried after `max(stagger, 1ms)`; if it still
/// cannot be spawned it is reported as a
/// [`FieldError::DeferredSchedulingFailure`].
async fn spawn_drivers(
    ctx: Arc<RunContext>,
    mut edges: mpsc::UnboundedReceiver<Edge>,
) -> Vec<JoinHandle<()>> {
    let retry_after = ctx.settings.stagger.max(Duration::from_millis(1));
    let mut drivers = Vec::new();
    let mut deferred: VecDeque<(Instant, Edge)> = VecDeque::new();
    let mut open = true;

    while open || !deferred.is_empty() {
        let next_retry = deferred.front().map(|(due, _)| *due);
        tokio::select! {
            biased;
            _ = sleep_until(next_retry.unwrap_or_else(Instant::now)), if next_retry.is_some() => {
                if let Some((_, (child, parent))) = deferred.pop_front() {
                    if !try_spawn(&ctx, &mut drivers, &child, &parent, true) {
                        warn!(
                            child = %child,
                            parent = %parent,
                            "dependency driver could not be scheduled after deferral"
                        );
                        ctx.record_warning(FieldError::DeferredSchedulingFailure { child, parent });
                    }
                }
            }
            edge = edges.recv(), if open => match edge {
                Some((child, parent)) => {
                    if !try_spawn(&ctx, &mut drivers, &child, &parent, false) {
                        debug!(child = %child, parent = %parent, "driver target not ready; deferring");
                        deferred.push_back((Instant::now() + retry_after, (child, parent)));
                    }
                }
                None => open = false,
            },
        }
    }

    drivers
}

/// Spawn the driver for `(child, parent)` if it can run right now.
///
/// Returns `true` when the edge is dealt with (spawned, or dropped because
/// the run is cancelled).
fn try_spawn(
    ctx: &Arc<RunContext>,
    drivers: &mut Vec<JoinHandle<()>>,
    child: &str,
    parent: &str,
    retry: bool,
) -> bool {
    if ctx.is_cancelled() {
        debug!(child = %child, parent = %parent, "run cancelled; not spawning driver");
        return true;
    }
    if !ctx.driver_ready(child, parent) {
        return false;
    }
    debug!(child = %child, parent = %parent, retry, "spawning dependency driver");
    drivers.push(tokio::spawn(drive_edge(
        Arc::clone(ctx),
        child.to_string(),
        parent.to_string(),
    )));
    true
}

async fn join_all(
    fields: &mut [(FieldName, JoinHandle<FieldExit>)],
    drivers: &mut [JoinHandle<()>],
) {
    for (field, handle) in fields.iter_mut() {
        if handle.is_finished() {
            continue;
        }
        match handle.await {
            Ok(exit) => debug!(field = %field, ?exit, "field task joined"),
            Err(err) => warn!(field = %field, error = %err, "field task panicked or was aborted"),
        }
    }
    for handle in drivers.iter_mut() {
        if !handle.is_finished() {
            let _ = handle.await;
        }
    }
}

async fn pause(d: Duration) {
    if !d.is_zero() {
        sleep(d).await;
    }
}
