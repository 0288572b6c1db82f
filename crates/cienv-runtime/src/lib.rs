//! Process runtime for cienv.
//!
//! Implements the ports defined in `cienv-core`: environment activation,
//! a `tokio::process` command runner, tool probing and the provisioner
//! that ties them together.

#![deny(unsafe_code)]

pub mod activate;
pub mod deps;
pub mod error;
pub mod progress;
pub mod provisioner;
pub mod runner;

pub use activate::{activate, activate_from_process, host_env};
pub use deps::{ToolStatus, check_tools, missing_tools, required_tools};
pub use error::{ProvisionError, ProvisionResult};
#[cfg(feature = "cli")]
pub use progress::CliProgress;
pub use progress::{NoopProgress, ProgressReporter};
pub use provisioner::{ProvisionReport, Provisioner, StepReport};
pub use runner::SystemCommandRunner;
