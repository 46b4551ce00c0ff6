// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawRecordConfig, RecordConfig};
use crate::errors::Result;

/// Load a record definition from a given path and return the raw config.
///
/// This only performs TOML deserialization; it does **not** run semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawRecordConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_str(&contents)
}

/// Parse a record definition from a TOML string.
pub fn parse_str(contents: &str) -> Result<RawRecordConfig> {
    let config: RawRecordConfig = toml::from_str(contents)?;
    Ok(config)
}

/// Load a record definition from path and run validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - at least one field,
///   - sane timeouts and a known terminal field,
///   - defaults that are part of the allowed values,
///   - cycles, when `cycle_policy = "reject"`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<RecordConfig> {
    let raw_config = load_from_path(&path)?;
    let config = RecordConfig::try_from(raw_config)?;
    Ok(config)
}
