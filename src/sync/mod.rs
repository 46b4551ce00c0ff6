// src/sync/mod.rs

//! Cross-task signalling primitives.
//!
//! - [`gate`] holds the per-child [`ReadinessGate`]: a join over one release
//!   per declared parent.
//! - [`notifier`] holds the per-parent [`CompletionSignal`]: a broadcast-once
//!   event that late subscribers still observe.
//!
//! These are the only signalling primitives in a run. Both are built on
//! `tokio::sync::watch`, which keeps the last value around, so a waiter that
//! subscribes after the signal fired returns immediately.

pub mod gate;
pub mod notifier;

pub use gate::{GateRelease, ReadinessGate};
pub use notifier::{CompletionSignal, NotifierSet};

/// Result of a bounded wait on a gate or signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The gate opened / the signal fired within the bound.
    Signalled,
    /// The bound elapsed first.
    TimedOut,
}
