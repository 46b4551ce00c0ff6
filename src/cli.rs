// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::{CyclePolicy, ResolutionOrder};

/// Command-line arguments for `fieldgate`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "fieldgate",
    version,
    about = "Resolve the fields of a record concurrently, honouring field dependencies.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the record definition (TOML).
    #[arg(long, value_name = "PATH", default_value = "Fieldgate.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FIELDGATE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Override `[config].cycle_policy` ("degrade" or "reject").
    #[arg(long, value_name = "POLICY", value_parser = parse_cycle_policy)]
    pub cycle_policy: Option<CyclePolicy>,

    /// Override `[config].resolution_order` ("before_parents" or "after_parents").
    #[arg(long, value_name = "ORDER", value_parser = parse_resolution_order)]
    pub resolution_order: Option<ResolutionOrder>,

    /// Parse + validate, print the graph and launch plan, but resolve nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_cycle_policy(s: &str) -> Result<CyclePolicy, String> {
    s.parse()
}

fn parse_resolution_order(s: &str) -> Result<ResolutionOrder, String> {
    s.parse()
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
