//! CLI-specific error types and exit code mapping.

use cienv_core::{ConfigError, RecordError, VariantError};
use cienv_runtime::ProvisionError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Required tools are not available.
    #[error("Missing required tools: {}", .0.join(", "))]
    MissingTools(Vec<String>),

    /// Nothing has been provisioned at the given prefix.
    #[error("No provision record at {0}")]
    NotProvisioned(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Arguments(_) => 2,       // EX_USAGE
            Self::MissingTools(_) => 69,   // EX_UNAVAILABLE
            Self::NotProvisioned(_) => 66, // EX_NOINPUT
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Arguments(err.to_string())
    }
}

impl From<VariantError> for CliError {
    fn from(err: VariantError) -> Self {
        Self::Arguments(err.to_string())
    }
}

/// Exit code for an error returned by a handler.
///
/// Failed provisioning steps keep the exit code of the command that failed.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(err) = err.downcast_ref::<ProvisionError>() {
        return err.exit_code();
    }
    if let Some(err) = err.downcast_ref::<CliError>() {
        return err.exit_code();
    }
    if err.downcast_ref::<ConfigError>().is_some() || err.downcast_ref::<VariantError>().is_some()
    {
        return 2;
    }
    if err.downcast_ref::<RecordError>().is_some() || err.downcast_ref::<std::io::Error>().is_some()
    {
        return 74; // EX_IOERR
    }
    1
}
