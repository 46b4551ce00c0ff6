// src/config/validate.rs

use crate::config::model::{RawRecordConfig, RecordConfig};
use crate::dag::DependencyGraph;
use crate::errors::{FieldgateError, Result};
use crate::types::CyclePolicy;

impl TryFrom<RawRecordConfig> for RecordConfig {
    type Error = crate::errors::FieldgateError;

    fn try_from(raw: RawRecordConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(RecordConfig::new_unchecked(raw.config, raw.field))
    }
}

fn validate_raw_config(cfg: &RawRecordConfig) -> Result<()> {
    ensure_has_fields(cfg)?;
    validate_global_config(cfg)?;
    validate_field_values(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_fields(cfg: &RawRecordConfig) -> Result<()> {
    if cfg.field.is_empty() {
        return Err(FieldgateError::ConfigError(
            "config must contain at least one [field.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawRecordConfig) -> Result<()> {
    let c = &cfg.config;
    let windows = [
        ("gate_timeout_ms", c.gate_timeout_ms),
        ("notifier_timeout_ms", c.notifier_timeout_ms),
        ("shutdown_grace_ms", c.shutdown_grace_ms),
    ];
    for (key, value) in windows {
        if value == 0 {
            return Err(FieldgateError::ConfigError(format!(
                "[config].{key} must be >= 1 (got 0)"
            )));
        }
    }

    if let Some(ref terminal) = c.terminal_field {
        if !cfg.field.contains_key(terminal) {
            return Err(FieldgateError::ConfigError(format!(
                "[config].terminal_field '{}' is not a declared field",
                terminal
            )));
        }
    }

    Ok(())
}

fn validate_field_values(cfg: &RawRecordConfig) -> Result<()> {
    for (name, field) in cfg.field.iter() {
        if let Some(ref default) = field.default {
            if !field.values.is_empty() && !field.values.contains(default) {
                return Err(FieldgateError::ConfigError(format!(
                    "field '{}' has default '{}' which is not one of its values",
                    name, default
                )));
            }
        }
    }
    Ok(())
}

/// Unknown parents and cycles are left to the executor unless the config
/// asks for cycles to be rejected up front.
fn validate_dag(cfg: &RawRecordConfig) -> Result<()> {
    if cfg.config.cycle_policy != CyclePolicy::Reject {
        return Ok(());
    }

    let graph = DependencyGraph::from_parents(
        cfg.field
            .iter()
            .map(|(name, field)| (name.clone(), field.after.clone())),
    );
    graph.ensure_acyclic()
}
