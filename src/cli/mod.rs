//! CLI argument parsing for lister
//!
//! Global flags: --config, --format, --quiet, --verbose, --log-level, --log-json

pub mod args;
pub mod output;
pub mod parse;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use args::{FetchArgs, PickArgs};
pub use output::OutputFormat;

/// Lister - pick values from remote lists
#[derive(Parser, Debug)]
#[command(name = "lister")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the preset config (defaults to ./lister.toml)
    #[arg(long, global = true, env = "LISTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level filter (e.g. "debug" or "lister_core=trace")
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List configured presets
    Presets,

    /// Fetch a preset once and print its options
    Fetch(FetchArgs),

    /// Open a picker session, select options and print the result
    Pick(PickArgs),
}
