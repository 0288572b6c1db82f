//! Port definitions implemented by adapters.
//!
//! Core owns the traits and their types; `cienv-runtime` owns the
//! implementations that actually spawn processes.

mod command_runner;

pub use command_runner::{CommandOutcome, CommandRunner, RunnerError};
