//! CLI entry point - the composition root.
//!
//! Loads `.env`, parses arguments, installs the tracing subscriber and
//! dispatches to the handlers. Errors are mapped to process exit codes here
//! and nowhere else.

use clap::{CommandFactory, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cienv_cli::{Cli, Commands, exit_code_for, handlers};

#[tokio::main]
async fn main() {
    // Load before parsing so clap sees variables from .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let code = exit_code_for(&err);
        debug!(exit_code = code, "Command failed");
        eprintln!("Error: {err:#}");
        std::process::exit(code);
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        // No command provided - show help
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Provision { args, json } => {
            handlers::provision::execute(&args, json, cli.verbose).await?;
        }
        Commands::Plan { args, json } => {
            handlers::plan::execute(&args, json)?;
        }
        Commands::Resolve {
            selector,
            cuda_toolkit,
        } => {
            handlers::resolve::execute(&selector, cuda_toolkit.as_deref())?;
        }
        Commands::CheckDeps { args, host } => {
            handlers::check_deps::execute(&args, host).await?;
        }
        Commands::Status { env_prefix, json } => {
            handlers::status::execute(&env_prefix, json)?;
        }
    }

    Ok(())
}
