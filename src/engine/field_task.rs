// src/engine/field_task.rs

//! The per-field task: the unit of work.
//!
//! Pending → Running → (parents?) WaitingOnParents → Completed, with Failed
//! when the resolver errors and an interrupted flag on cancellation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::FieldStatus;
use crate::engine::trace::TraceEventKind;
use crate::engine::{FieldName, RunContext};
use crate::errors::FieldError;
use crate::sync::{CompletionSignal, ReadinessGate, WaitOutcome};
use crate::types::ResolutionOrder;

/// How a field task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldExit {
    Completed,
    /// Completed after its gate timed out or behind a degraded parent.
    Degraded,
    Failed,
    Interrupted,
    /// Another task already owned the field.
    Skipped,
}

/// Run one field to completion or until the run is cancelled.
pub(crate) async fn run_field(ctx: Arc<RunContext>, field: FieldName) -> FieldExit {
    tokio::select! {
        biased;
        _ = ctx.cancelled() => {
            ctx.interrupt(&field);
            FieldExit::Interrupted
        }
        exit = field_body(&ctx, &field) => exit,
    }
}

async fn field_body(ctx: &RunContext, field: &str) -> FieldExit {
    // Gate first, registration second: a driver that sees the field
    // registered can rely on the gate being there.
    let gate = ctx.arm_gate(field);
    if !ctx.registry.register(field) {
        return FieldExit::Skipped;
    }
    let signal = ctx
        .graph
        .has_dependents(field)
        .then(|| ctx.notifiers.ensure(field));

    ctx.trace.record(field, TraceEventKind::Started);
    debug!(
        field = %field,
        parents = ctx.graph.parents_of(field).len(),
        dependents = ctx.graph.dependents_of(field).len(),
        "field task started"
    );

    let outcome = match ctx.settings.resolution_order {
        ResolutionOrder::BeforeParents => match resolve(ctx, field).await {
            Ok(()) => Ok(await_parents(ctx, field, gate.as_deref()).await),
            Err(message) => Err(message),
        },
        ResolutionOrder::AfterParents => {
            let degraded = await_parents(ctx, field, gate.as_deref()).await;
            resolve(ctx, field).await.map(|()| degraded)
        }
    };

    match outcome {
        Ok(degraded) => finish(ctx, field, degraded, signal.as_deref()),
        Err(message) => fail(ctx, field, message, signal.as_deref()),
    }
}

/// Call the resolver and store its value. `Err` carries the failure message.
async fn resolve(ctx: &RunContext, field: &str) -> Result<(), String> {
    let snapshot = ctx.registry.record_snapshot();
    match ctx.resolver.resolve(field, &snapshot).await {
        Ok(value) => {
            debug!(field = %field, value = %value, "field resolved");
            ctx.registry.set_value(field, value);
            Ok(())
        }
        Err(err) => Err(err.to_string()),
    }
}

/// Block on the readiness gate, if any. Returns `true` when the wait timed
/// out and the field goes on degraded.
async fn await_parents(ctx: &RunContext, field: &str, gate: Option<&ReadinessGate>) -> bool {
    let Some(gate) = gate else {
        return false;
    };

    ctx.registry.set_status(field, FieldStatus::WaitingOnParents);
    let limit = ctx.settings.gate_timeout;

    match gate.wait_from(ctx.launch_settled(), limit).await {
        WaitOutcome::Signalled => false,
        WaitOutcome::TimedOut => {
            let missing = gate.missing();
            warn!(
                field = %field,
                ?missing,
                waited = ?limit,
                "gate timed out; completing without full parent confirmation"
            );
            ctx.record_warning(FieldError::GateTimeout {
                field: field.to_string(),
                waited: limit,
                missing: missing.len(),
            });
            ctx.trace.record(field, TraceEventKind::TimedOut { missing });
            true
        }
    }
}

fn finish(
    ctx: &RunContext,
    field: &str,
    degraded: bool,
    signal: Option<&CompletionSignal>,
) -> FieldExit {
    // A degraded parent taints its dependents.
    let degraded = degraded || ctx.registry.is_degraded(field);

    // Trace before the registry flips to finished: drivers take the fast
    // path on `is_finished`, and dependents' events must sort after ours.
    ctx.trace.record(field, TraceEventKind::Completed { degraded });
    ctx.registry.complete(field, degraded);
    info!(field = %field, degraded, "field completed");

    if let Some(signal) = signal {
        signal.fire();
    }

    if degraded {
        FieldExit::Degraded
    } else {
        FieldExit::Completed
    }
}

fn fail(
    ctx: &RunContext,
    field: &str,
    message: String,
    signal: Option<&CompletionSignal>,
) -> FieldExit {
    warn!(field = %field, error = %message, "resolver failed");
    ctx.record_warning(FieldError::ResolverFailure {
        field: field.to_string(),
        message: message.clone(),
    });
    ctx.trace.record(
        field,
        TraceEventKind::Failed {
            message: message.clone(),
        },
    );
    ctx.registry.fail(field, message);

    // A failed parent still releases its dependents.
    if let Some(signal) = signal {
        signal.fire();
    }
    FieldExit::Failed
}
