//! Command runner port.
//!
//! Every external collaborator (git, pip, conda, the interpreter) is an
//! opaque command that either succeeds or fails. This port lets the
//! provisioner run them without knowing how they are spawned, so tests can
//! substitute a mock runner.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::env::EnvHandle;
use crate::plan::CommandSpec;

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub elapsed: Duration,
}

impl CommandOutcome {
    pub const fn new(code: Option<i32>, elapsed: Duration) -> Self {
        Self { code, elapsed }
    }

    pub const fn success(elapsed: Duration) -> Self {
        Self::new(Some(0), elapsed)
    }

    pub const fn failure(code: i32, elapsed: Duration) -> Self {
        Self::new(Some(code), elapsed)
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Errors raised before a command could produce an exit status.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Program could not be found on the environment's search path
    #[error("program '{program}' not found on PATH")]
    NotFound { program: String },

    /// Process could not be started
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the process failed
    #[error("failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunnerError {
    pub fn program(&self) -> &str {
        match self {
            Self::NotFound { program } | Self::Spawn { program, .. } | Self::Wait { program, .. } => {
                program
            }
        }
    }
}

/// Runs external commands inside an activated environment.
///
/// A non-zero exit is reported through [`CommandOutcome`], not as an error;
/// deciding that a failed command is fatal is the caller's job.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        command: &CommandSpec,
        env: &EnvHandle,
    ) -> Result<CommandOutcome, RunnerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_requires_zero_exit() {
        assert!(CommandOutcome::success(Duration::ZERO).is_success());
        assert!(!CommandOutcome::failure(3, Duration::ZERO).is_success());
        assert!(!CommandOutcome::new(None, Duration::ZERO).is_success());
    }

    #[test]
    fn runner_error_names_program() {
        let err = RunnerError::NotFound {
            program: "conda".to_string(),
        };
        assert_eq!(err.program(), "conda");
        assert_eq!(err.to_string(), "program 'conda' not found on PATH");
    }
}
