// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::ExecutorSettings;
use crate::types::{CyclePolicy, ResolutionOrder};

/// Record definition as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// gate_timeout_ms = 100
/// terminal_field = "summary"
///
/// [field.country]
/// values = ["NO", "SE"]
///
/// [field.currency]
/// after = ["country"]
/// values = ["NOK", "SEK"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecordConfig {
    /// Executor behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All fields from `[field.<name>]`, keyed by field name.
    #[serde(default)]
    pub field: BTreeMap<String, FieldConfig>,
}

/// A validated record definition.
///
/// Only obtainable through `TryFrom<RawRecordConfig>` (see `validate.rs`), so
/// holding one means the basic invariants have been checked.
#[derive(Debug, Clone)]
pub struct RecordConfig {
    pub config: ConfigSection,
    pub field: BTreeMap<String, FieldConfig>,
}

impl RecordConfig {
    pub(crate) fn new_unchecked(config: ConfigSection, field: BTreeMap<String, FieldConfig>) -> Self {
        Self { config, field }
    }

    /// Executor settings derived from `[config]`.
    pub fn settings(&self) -> ExecutorSettings {
        self.config.settings()
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// How long a field with parents waits on its readiness gate.
    #[serde(default = "default_gate_timeout_ms")]
    pub gate_timeout_ms: u64,

    /// How long a dependency driver waits on its parent's completion signal.
    #[serde(default = "default_notifier_timeout_ms")]
    pub notifier_timeout_ms: u64,

    /// Delay between consecutive field launches.
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,

    /// How long every other field gets to start before the terminal field
    /// is launched.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    /// How long shutdown waits for in-flight tasks before cancelling them.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,

    /// Field launched last, after everything else had a chance to start.
    #[serde(default)]
    pub terminal_field: Option<String>,

    #[serde(default)]
    pub cycle_policy: CyclePolicy,

    #[serde(default)]
    pub resolution_order: ResolutionOrder,

    /// Seed used to shuffle the launch order of standalone fields.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

fn default_gate_timeout_ms() -> u64 {
    100
}

fn default_notifier_timeout_ms() -> u64 {
    100
}

fn default_stagger_ms() -> u64 {
    2
}

fn default_grace_period_ms() -> u64 {
    50
}

fn default_shutdown_grace_ms() -> u64 {
    2_000
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            gate_timeout_ms: default_gate_timeout_ms(),
            notifier_timeout_ms: default_notifier_timeout_ms(),
            stagger_ms: default_stagger_ms(),
            grace_period_ms: default_grace_period_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            terminal_field: None,
            cycle_policy: CyclePolicy::default(),
            resolution_order: ResolutionOrder::default(),
            shuffle_seed: None,
        }
    }
}

impl ConfigSection {
    pub fn settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            gate_timeout: Duration::from_millis(self.gate_timeout_ms),
            notifier_timeout: Duration::from_millis(self.notifier_timeout_ms),
            stagger: Duration::from_millis(self.stagger_ms),
            grace_period: Duration::from_millis(self.grace_period_ms),
            shutdown_grace: Duration::from_millis(self.shutdown_grace_ms),
            terminal_field: self.terminal_field.clone(),
            resolution_order: self.resolution_order,
            shuffle_seed: self.shuffle_seed,
        }
    }
}

/// `[field.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldConfig {
    /// Parent fields: this field is only fully resolved after all of these.
    #[serde(default)]
    pub after: Vec<String>,

    /// Allowed values (the reference set the built-in resolver picks from).
    #[serde(default)]
    pub values: Vec<String>,

    /// Preferred value; must be one of `values` when both are given.
    #[serde(default)]
    pub default: Option<String>,
}
