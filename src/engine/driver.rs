// src/engine/driver.rs

//! Dependency driver: bridges one parent's completion into one release of
//! one child's readiness gate.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::engine::trace::TraceEventKind;
use crate::engine::{FieldName, RunContext};
use crate::errors::FieldError;
use crate::sync::WaitOutcome;

/// Drive the `(child, parent)` edge until the parent confirms, the wait
/// times out, or the run is cancelled.
pub async fn drive_edge(ctx: Arc<RunContext>, child: FieldName, parent: FieldName) {
    tokio::select! {
        biased;
        _ = ctx.cancelled() => {
            debug!(child = %child, parent = %parent, "driver cancelled");
        }
        _ = drive_body(&ctx, &child, &parent) => {}
    }
}

async fn drive_body(ctx: &RunContext, child: &str, parent: &str) {
    let Some(gate) = ctx.gate_of(child) else {
        warn!(child = %child, parent = %parent, "driver started for a field without a gate");
        return;
    };

    let fast_path = ctx.registry.is_finished(parent);
    if !fast_path {
        let signal = ctx.notifiers.ensure(parent);
        ctx.trace.record(
            child,
            TraceEventKind::AwaitingParent {
                parent: parent.to_string(),
            },
        );

        let limit = ctx.settings.notifier_timeout;
        if signal.wait_from(ctx.launch_settled(), limit).await == WaitOutcome::TimedOut {
            warn!(
                child = %child,
                parent = %parent,
                waited = ?limit,
                "gave up waiting on parent"
            );
            ctx.record_warning(FieldError::NotifierTimeout {
                child: child.to_string(),
                parent: parent.to_string(),
                waited: limit,
            });
            ctx.trace.record(
                child,
                TraceEventKind::NotifierTimedOut {
                    parent: parent.to_string(),
                },
            );
            return;
        }
    }

    // Everything is recorded before the release: once the gate opens the
    // child may complete.
    let added = ctx.registry.record_ancestors(child, parent);
    let degraded = ctx.registry.is_degraded(parent);
    if degraded {
        ctx.registry.mark_degraded(child);
    }
    ctx.trace.record(
        child,
        TraceEventKind::ParentResolved {
            parent: parent.to_string(),
            fast_path,
            degraded,
        },
    );
    let release = gate.release(parent);
    debug!(
        child = %child,
        parent = %parent,
        fast_path,
        degraded,
        ?added,
        ?release,
        "parent resolved"
    );
}
