#![allow(dead_code)]

use std::collections::BTreeMap;
use std::time::Duration;

use fieldgate::config::{ConfigSection, FieldConfig, RawRecordConfig, RecordConfig};
use fieldgate::dag::DependencyGraph;
use fieldgate::engine::ExecutorSettings;
use fieldgate::types::{CyclePolicy, ResolutionOrder};

/// Builder for `RecordConfig` to simplify test setup.
pub struct RecordConfigBuilder {
    config: RawRecordConfig,
}

impl RecordConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawRecordConfig {
                config: ConfigSection::default(),
                field: BTreeMap::new(),
            },
        }
    }

    pub fn with_field(mut self, name: &str, field: FieldConfig) -> Self {
        self.config.field.insert(name.to_string(), field);
        self
    }

    /// Shorthand for a field with a single allowed value `<name>-v`.
    pub fn with_simple_field(self, name: &str, after: &[&str]) -> Self {
        let mut field = FieldConfigBuilder::new().value(&format!("{name}-v"));
        for parent in after {
            field = field.after(parent);
        }
        self.with_field(name, field.build())
    }

    pub fn gate_timeout_ms(mut self, ms: u64) -> Self {
        self.config.config.gate_timeout_ms = ms;
        self
    }

    pub fn notifier_timeout_ms(mut self, ms: u64) -> Self {
        self.config.config.notifier_timeout_ms = ms;
        self
    }

    pub fn stagger_ms(mut self, ms: u64) -> Self {
        self.config.config.stagger_ms = ms;
        self
    }

    pub fn grace_period_ms(mut self, ms: u64) -> Self {
        self.config.config.grace_period_ms = ms;
        self
    }

    pub fn shutdown_grace_ms(mut self, ms: u64) -> Self {
        self.config.config.shutdown_grace_ms = ms;
        self
    }

    pub fn terminal(mut self, name: &str) -> Self {
        self.config.config.terminal_field = Some(name.to_string());
        self
    }

    pub fn cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.config.config.cycle_policy = policy;
        self
    }

    pub fn resolution_order(mut self, order: ResolutionOrder) -> Self {
        self.config.config.resolution_order = order;
        self
    }

    pub fn shuffle_seed(mut self, seed: u64) -> Self {
        self.config.config.shuffle_seed = Some(seed);
        self
    }

    pub fn build_raw(self) -> RawRecordConfig {
        self.config
    }

    pub fn build(self) -> RecordConfig {
        RecordConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for RecordConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `FieldConfig`.
pub struct FieldConfigBuilder {
    field: FieldConfig,
}

impl FieldConfigBuilder {
    pub fn new() -> Self {
        Self {
            field: FieldConfig::default(),
        }
    }

    pub fn after(mut self, parent: &str) -> Self {
        self.field.after.push(parent.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.field.values.push(value.to_string());
        self
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.field.default = Some(value.to_string());
        self
    }

    pub fn build(self) -> FieldConfig {
        self.field
    }
}

impl Default for FieldConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Graph from `(field, parents)` pairs.
pub fn graph(layout: &[(&str, &[&str])]) -> DependencyGraph {
    DependencyGraph::from_parents(layout.iter().map(|(name, parents)| {
        (
            name.to_string(),
            parents.iter().map(|p| p.to_string()).collect(),
        )
    }))
}

/// Settings with generous waits and minimal launch delays, for runs where
/// every parent is expected to confirm.
pub fn relaxed_settings() -> ExecutorSettings {
    ExecutorSettings {
        gate_timeout: Duration::from_secs(5),
        notifier_timeout: Duration::from_secs(5),
        stagger: Duration::from_millis(1),
        grace_period: Duration::from_millis(20),
        shutdown_grace: Duration::from_secs(8),
        ..ExecutorSettings::default()
    }
}

/// Settings with short waits, for runs that are expected to degrade.
pub fn tight_settings() -> ExecutorSettings {
    ExecutorSettings {
        gate_timeout: Duration::from_millis(80),
        notifier_timeout: Duration::from_millis(80),
        stagger: Duration::from_millis(1),
        grace_period: Duration::from_millis(10),
        shutdown_grace: Duration::from_secs(2),
        ..ExecutorSettings::default()
    }
}
