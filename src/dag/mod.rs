// src/dag/mod.rs

//! Dependency graph and per-field state.
//!
//! - [`graph`] holds the read-only [`DependencyGraph`] and the
//!   [`RuleSource`] it is built from.
//! - [`field_info`] defines the per-field lifecycle record and the record
//!   snapshot handed to resolvers.
//! - [`registry`] is the Field State Registry, the only mutable table
//!   shared between tasks.

pub mod field_info;
pub mod graph;
pub mod registry;

pub use field_info::{FieldState, FieldStatus, RecordSnapshot};
pub use graph::{DependencyGraph, RuleSource};
pub use registry::FieldRegistry;
