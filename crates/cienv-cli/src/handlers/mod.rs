//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub fn execute(...) -> Result<()>` (async where they run commands)
//! - Thin wrappers that:
//!   1. Turn CLI arguments into a `ProvisionConfig`
//!   2. Call into `cienv-runtime`
//!   3. Format output for the terminal
//!
//! Handlers should NOT build commands themselves; the plan is the only
//! source of what gets executed.

pub mod check_deps;
pub mod plan;
pub mod provision;
pub mod resolve;
pub mod status;
