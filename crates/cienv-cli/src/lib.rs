//! `cienv` command-line interface.
//!
//! Parsing, command handlers and exit code mapping. `main.rs` is the
//! composition root that wires logging and dispatches to the handlers.

#![deny(unsafe_code)]

// Used by main.rs only
use dotenvy as _;
use tracing as _;
use tracing_subscriber as _;

pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use commands::{Commands, ProvisionArgs};
pub use error::{CliError, exit_code_for};
pub use parser::Cli;
