//! Tool availability checks.
//!
//! Resolves each program a plan needs against the activated environment and
//! reads its version string, so a missing tool is reported up front instead
//! of halfway through a run.

use cienv_core::{EnvHandle, ProvisionPlan};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::runner::resolve_program;

/// What was found for one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStatus {
    pub name: String,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
}

impl ToolStatus {
    pub const fn is_available(&self) -> bool {
        self.path.is_some()
    }
}

/// Distinct programs invoked by the plan, in first-use order.
pub fn required_tools(plan: &ProvisionPlan) -> Vec<String> {
    let mut seen = BTreeSet::new();
    plan.steps
        .iter()
        .map(|step| step.command.program.clone())
        .filter(|program| seen.insert(program.clone()))
        .collect()
}

/// Look up each tool on the handle's `PATH` and query `--version`.
pub async fn check_tools(names: &[String], env: &EnvHandle) -> Vec<ToolStatus> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| env.prefix().to_path_buf());
    let mut statuses = Vec::with_capacity(names.len());

    for name in names {
        let path = resolve_program(name, env, &cwd).ok();
        let version = match &path {
            Some(path) => command_version(path, env).await,
            None => None,
        };
        debug!(tool = %name, found = path.is_some(), version = ?version, "Checked tool");
        statuses.push(ToolStatus {
            name: name.clone(),
            path,
            version,
        });
    }

    statuses
}

/// Names of tools that were not found.
pub fn missing_tools(statuses: &[ToolStatus]) -> Vec<&str> {
    statuses
        .iter()
        .filter(|s| !s.is_available())
        .map(|s| s.name.as_str())
        .collect()
}

async fn command_version(program: &Path, env: &EnvHandle) -> Option<String> {
    let mut cmd = Command::new(program);
    cmd.arg("--version")
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

    let output = cmd.output().await.ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    // Older interpreters print their version to stderr
    let text = if stdout.trim().is_empty() {
        stderr
    } else {
        stdout
    };

    text.lines().next().and_then(parse_version_line)
}

/// Pull the version token out of a `--version` banner.
///
/// `"git version 2.43.0"` gives `2.43.0`, `"pip 24.0 from /env/lib (python 3.11)"`
/// gives `24.0`, `"conda 24.1.2"` gives `24.1.2`.
pub fn parse_version_line(line: &str) -> Option<String> {
    line.split_whitespace()
        .map(|token| token.trim_start_matches('v').trim_end_matches(','))
        .find(|token| token.starts_with(|c: char| c.is_ascii_digit()) && token.contains('.'))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cienv_core::{Platform, ProvisionConfig};

    #[test]
    fn version_tokens_are_extracted() {
        assert_eq!(parse_version_line("git version 2.43.0").as_deref(), Some("2.43.0"));
        assert_eq!(parse_version_line("Python 3.11.7").as_deref(), Some("3.11.7"));
        assert_eq!(
            parse_version_line("pip 24.0 from /env/lib/python3.11/site-packages/pip (python 3.11)")
                .as_deref(),
            Some("24.0")
        );
        assert_eq!(parse_version_line("conda 24.1.2").as_deref(), Some("24.1.2"));
        assert_eq!(parse_version_line("v20.10.0").as_deref(), Some("20.10.0"));
        assert_eq!(parse_version_line("no version here"), None);
    }

    #[test]
    fn cpu_plan_never_needs_conda() {
        let plan = ProvisionPlan::build(&ProvisionConfig::new("cpu"), Platform::Linux).unwrap();
        let tools = required_tools(&plan);
        assert_eq!(tools, vec!["git", "pip", "python"]);
    }

    #[test]
    fn gpu_plan_needs_conda() {
        let plan = ProvisionPlan::build(&ProvisionConfig::new("cu113"), Platform::Linux).unwrap();
        assert!(required_tools(&plan).contains(&"conda".to_string()));
    }

    #[test]
    fn unknown_tool_is_reported_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = EnvHandle::host(Some(dir.path().display().to_string()));
        let statuses =
            tokio_test::block_on(check_tools(&["no-such-tool-here".to_string()], &env));
        assert_eq!(missing_tools(&statuses), vec!["no-such-tool-here"]);
        assert_eq!(statuses[0].version, None);
    }
}
