//! Command runner backed by `tokio::process`.
//!
//! Programs are resolved against the environment handle's `PATH`, the
//! handle's variables are applied to the child, and stdout/stderr are
//! streamed line by line into tracing while the child runs.

use async_trait::async_trait;
use cienv_core::{CommandOutcome, CommandRunner, CommandSpec, EnvHandle, RunnerError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Runs commands as child processes of the current process.
#[derive(Debug, Clone, Copy)]
pub struct SystemCommandRunner {
    echo_output: bool,
}

impl SystemCommandRunner {
    /// Runner that logs child output at `info` level.
    pub const fn new() -> Self {
        Self { echo_output: true }
    }

    /// Runner that logs child output at `debug` level only.
    pub const fn quiet() -> Self {
        Self { echo_output: false }
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(
        &self,
        command: &CommandSpec,
        env: &EnvHandle,
    ) -> Result<CommandOutcome, RunnerError> {
        let cwd = match &command.cwd {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|source| RunnerError::Spawn {
                program: command.program.clone(),
                source,
            })?,
        };
        let program = resolve_program(&command.program, env, &cwd)?;
        debug!(program = %program.display(), cwd = %cwd.display(), "Spawning command");

        let mut cmd = Command::new(&program);
        cmd.args(&command.args)
            .current_dir(&cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for key in env.removed() {
            cmd.env_remove(key);
        }
        for (key, value) in env.vars() {
            cmd.env(key, value);
        }

        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            program: command.program.clone(),
            source,
        })?;

        let readers = spawn_log_readers(&mut child, &command.program, self.echo_output);

        let status = child.wait().await.map_err(|source| RunnerError::Wait {
            program: command.program.clone(),
            source,
        })?;

        // Drain remaining output so it is logged before the next step starts
        for reader in readers {
            if let Err(e) = reader.await {
                debug!(program = %command.program, error = %e, "Output reader task failed");
            }
        }

        Ok(CommandOutcome::new(status.code(), started.elapsed()))
    }
}

/// Resolve a program name against the handle's search path.
///
/// Names containing a path separator are used as given.
pub(crate) fn resolve_program(
    program: &str,
    env: &EnvHandle,
    cwd: &Path,
) -> Result<PathBuf, RunnerError> {
    if program.contains(std::path::MAIN_SEPARATOR) || program.contains('/') {
        return Ok(PathBuf::from(program));
    }

    let found = match env.path_var() {
        Some(path) => which::which_in(program, Some(path), cwd),
        None => which::which(program),
    };

    found.map_err(|_| RunnerError::NotFound {
        program: program.to_string(),
    })
}

/// Spawn background tasks that forward child stdout/stderr lines to tracing.
///
/// The tasks exit when the streams close.
fn spawn_log_readers(child: &mut Child, program: &str, echo: bool) -> Vec<JoinHandle<()>> {
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_reader(stdout, program.to_string(), "stdout", echo));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_reader(stderr, program.to_string(), "stderr", echo));
    }
    readers
}

fn spawn_reader<R>(stream: R, program: String, stream_type: &'static str, echo: bool) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(text)) = lines.next_line().await {
            if echo {
                info!(target: "cienv::child", program = %program, stream = stream_type, "{}", text);
            } else {
                debug!(target: "cienv::child", program = %program, stream = stream_type, "{}", text);
            }
        }
    })
}
