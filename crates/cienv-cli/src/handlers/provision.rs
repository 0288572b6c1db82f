//! Provision command handler.

use anyhow::Result;
use std::io::IsTerminal;
use std::sync::Arc;

use cienv_runtime::{
    CliProgress, NoopProgress, ProgressReporter, ProvisionReport, Provisioner, SystemCommandRunner,
};

use crate::commands::ProvisionArgs;
use crate::error::CliError;
use crate::presentation::format_duration;

/// Execute the provision command.
///
/// Runs every step of the plan inside the activated environment and stops
/// at the first failure. The returned error carries the failing command's
/// exit code.
pub async fn execute(args: &ProvisionArgs, json: bool, verbose: bool) -> Result<()> {
    let config = args.to_config().map_err(CliError::from)?;

    // Child output is only echoed when no step bar is drawn over it
    let show_bar = std::io::stderr().is_terminal() && !verbose && !json;
    let progress: Arc<dyn ProgressReporter> = if show_bar {
        Arc::new(CliProgress::new())
    } else {
        Arc::new(NoopProgress)
    };
    let runner = if show_bar {
        SystemCommandRunner::quiet()
    } else {
        SystemCommandRunner::new()
    };

    let report = Provisioner::new(runner)
        .with_progress(progress)
        .with_tool_version(cienv_build_info::LONG_VERSION)
        .provision(&config)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ProvisionReport) {
    println!(
        "Provisioned {} on {} ({})",
        report.variant, report.platform, report.toolkit
    );
    println!();
    println!("{:<24} {:>10}  COMMAND", "STEP", "TIME");
    println!("{}", "=".repeat(72));
    for step in &report.steps {
        println!(
            "{:<24} {:>10}  {}",
            step.kind.name(),
            format_duration(step.elapsed),
            step.command
        );
    }
    println!("{}", "=".repeat(72));
    println!("Total: {}", format_duration(report.total_elapsed()));
    if let Some(path) = &report.record_path {
        println!("Record: {}", path.display());
    }
}
