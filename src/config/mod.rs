// src/config/mod.rs

//! Record definition loading and validation for fieldgate.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a definition from disk (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).
//!
//! A validated [`RecordConfig`] doubles as the built-in
//! [`RuleSource`](crate::dag::RuleSource).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str};
pub use model::{ConfigSection, FieldConfig, RawRecordConfig, RecordConfig};
