//! Core domain types for cienv.
//!
//! This crate is pure: it parses compute variants, holds configuration,
//! builds the provisioning plan and defines the ports that adapters
//! implement. Nothing here spawns processes or touches the filesystem
//! beyond reading and writing the provision record.
//!
//! ```rust
//! use cienv_core::{ComputeVariant, CudaVersion};
//!
//! let variant = ComputeVariant::parse("cu113").unwrap();
//! assert_eq!(variant, ComputeVariant::Cuda(CudaVersion::new(11, 3)));
//! assert_eq!(variant.toolkit_constraint(), "cudatoolkit=11.3");
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod env;
pub mod plan;
pub mod platform;
pub mod ports;
pub mod record;
pub mod variant;

pub use config::{CompanionSpec, ConfigError, FrameworkSpec, ProjectSpec, ProvisionConfig};
pub use env::EnvHandle;
pub use plan::{CommandSpec, ProvisionPlan, Step, StepKind};
pub use platform::Platform;
pub use ports::{CommandOutcome, CommandRunner, RunnerError};
pub use record::{ProvisionRecord, RECORD_FILE_NAME, RecordError};
pub use variant::{ComputeVariant, CudaVersion, VariantError};
