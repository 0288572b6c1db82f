//! Check-deps command handler.
//!
//! Checks the external tools the plan invokes (`git`, `pip`, `conda`,
//! `python`) and prints one row per tool.

use anyhow::Result;

use cienv_core::{Platform, ProvisionConfig, ProvisionPlan};
use cienv_runtime::{ToolStatus, activate_from_process, host_env, check_tools, missing_tools, required_tools};

use crate::commands::ProvisionArgs;
use crate::error::CliError;
use crate::presentation::{BOLD, GREEN, RED, RESET, format_optional, print_separator};

pub async fn execute(args: &ProvisionArgs, host: bool) -> Result<()> {
    let config = args.to_config().map_err(CliError::from)?;
    let tools = tools_for(&config);

    let env = if host {
        host_env()
    } else {
        activate_from_process(&config.env_prefix, &config.stale_vars)?
    };

    let location = if env.is_host() {
        "host PATH".to_string()
    } else {
        env.prefix().display().to_string()
    };
    println!("{BOLD}Checking tools in {location}...{RESET}\n");

    let statuses = check_tools(&tools, &env).await;

    println!("{BOLD}{:<10} {:<12} {:<50}{RESET}", "TOOL", "VERSION", "PATH");
    print_separator(74);
    for status in &statuses {
        print_status(status);
    }
    print_separator(74);

    let missing = missing_tools(&statuses);
    if missing.is_empty() {
        println!("{GREEN}✓ All required tools are available{RESET} ({}/{})", statuses.len(), statuses.len());
        Ok(())
    } else {
        Err(CliError::MissingTools(missing.iter().map(|s| (*s).to_string()).collect()).into())
    }
}

/// Tools the configured plan needs; every collaborator when the selector
/// cannot be resolved yet.
fn tools_for(config: &ProvisionConfig) -> Vec<String> {
    match ProvisionPlan::build(config, Platform::detect()) {
        Ok(plan) => required_tools(&plan),
        Err(_) => vec![
            config.git.clone(),
            config.pip.clone(),
            config.conda.clone(),
            config.python.clone(),
        ],
    }
}

fn print_status(status: &ToolStatus) {
    let path = status
        .path
        .as_ref()
        .map(|p| p.display().to_string());
    if status.is_available() {
        println!(
            "{GREEN}{:<10}{RESET} {:<12} {:<50}",
            status.name,
            format_optional(status.version.as_ref(), "unknown"),
            format_optional(path.as_ref(), "")
        );
    } else {
        println!("{RED}{:<10}{RESET} {:<12} {:<50}", status.name, "-", "not found");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_selector_checks_every_tool() {
        let tools = tools_for(&ProvisionConfig::new(""));
        assert_eq!(tools, vec!["git", "pip", "conda", "python"]);
    }

    #[test]
    fn cpu_selector_skips_conda() {
        let tools = tools_for(&ProvisionConfig::new("cpu"));
        assert!(!tools.contains(&"conda".to_string()));
    }
}
