//! Error types for provisioning.
//!
//! One error type for the whole run, so orchestration code can use `?`
//! everywhere and the CLI can map any failure to an exit code.

use cienv_core::{ConfigError, RecordError, RunnerError, StepKind, VariantError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while provisioning an environment.
#[derive(Debug, Error)]
pub enum ProvisionError {
    // === Resolution ===
    /// Configuration value could not be read
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Compute variant selector could not be resolved
    #[error(transparent)]
    Variant(#[from] VariantError),

    // === Activation ===
    /// Isolated environment does not exist or is not an environment
    #[error("isolated environment not found at {}: {reason}", .prefix.display())]
    EnvironmentMissing { prefix: PathBuf, reason: String },

    // === Execution ===
    /// Command could not be started
    #[error("step '{step}' could not run: {source}")]
    Runner {
        step: StepKind,
        #[source]
        source: RunnerError,
    },

    /// Command ran and failed
    #[error("step '{step}' failed ({}): {command}", exit_status_label(.code))]
    StepFailed {
        step: StepKind,
        command: String,
        code: Option<i32>,
    },

    // === Record & IO ===
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProvisionError {
    pub fn environment_missing(prefix: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::EnvironmentMissing {
            prefix: prefix.into(),
            reason: reason.into(),
        }
    }

    /// Process exit code for this failure.
    ///
    /// Failed steps propagate the command's own exit code, like `set -e`.
    /// Everything else follows sysexits.h.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::StepFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            Self::StepFailed { .. } => 1,
            Self::Config(_) | Self::Variant(_) => 2,
            Self::Runner {
                source: RunnerError::NotFound { .. },
                ..
            } => 127,
            Self::Runner { .. } => 71,   // EX_OSERR
            Self::Record(_) | Self::Io(_) => 74, // EX_IOERR
            Self::EnvironmentMissing { .. } => 78, // EX_CONFIG
        }
    }

    /// Step that failed, if the failure happened while executing the plan.
    pub const fn step(&self) -> Option<StepKind> {
        match self {
            Self::Runner { step, .. } | Self::StepFailed { step, .. } => Some(*step),
            _ => None,
        }
    }
}

#[allow(clippy::ref_option)]
fn exit_status_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Result type alias for provisioning operations
pub type ProvisionResult<T> = Result<T, ProvisionError>;
