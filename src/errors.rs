// src/errors.rs

//! Crate-wide error types.
//!
//! - [`FieldgateError`] covers everything that stops a run before it starts
//!   (config, IO, TOML, rejected cycles).
//! - [`FieldError`] is the per-field / per-edge taxonomy recorded while a run
//!   is in flight. None of these abort the run; they end up in the
//!   [`RunReport`](crate::engine::RunReport) as warnings.

use std::time::Duration;

use thiserror::Error;

use crate::engine::FieldName;

#[derive(Error, Debug)]
pub enum FieldgateError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cycle detected in dependency graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Problems observed while the executor is running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// A dependency driver could never be spawned, e.g. because the child
    /// never registered or the parent names a field that does not exist.
    #[error("could not schedule dependency driver {child} <- {parent} after deferral")]
    DeferredSchedulingFailure { child: FieldName, parent: FieldName },

    /// A child gave up waiting on its gate and completed without full
    /// parent confirmation.
    #[error("field '{field}' proceeded after {waited:?} with {missing} parent signal(s) missing")]
    GateTimeout {
        field: FieldName,
        waited: Duration,
        missing: usize,
    },

    /// A driver gave up waiting on a parent's completion signal.
    #[error("driver for '{child}' gave up waiting on parent '{parent}' after {waited:?}")]
    NotifierTimeout {
        child: FieldName,
        parent: FieldName,
        waited: Duration,
    },

    #[error("resolver failed for field '{field}': {message}")]
    ResolverFailure { field: FieldName, message: String },

    #[error("field '{field}' was interrupted")]
    Interrupted { field: FieldName },
}

impl FieldError {
    /// Name of the field this problem is recorded against.
    pub fn field(&self) -> &str {
        match self {
            FieldError::DeferredSchedulingFailure { child, .. } => child,
            FieldError::GateTimeout { field, .. } => field,
            FieldError::NotifierTimeout { child, .. } => child,
            FieldError::ResolverFailure { field, .. } => field,
            FieldError::Interrupted { field } => field,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FieldgateError>;
