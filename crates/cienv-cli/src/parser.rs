//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Provision CI environments for nightly framework builds.
///
/// Global options apply to every subcommand.
#[derive(Parser)]
#[command(name = "cienv")]
#[command(about = "Provision a CI environment: framework, companion library and project build")]
#[command(version = cienv_build_info::LONG_VERSION)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
