//! Plan command handler.
//!
//! Prints exactly what `provision` would run. Nothing is activated or
//! executed.

use anyhow::Result;

use cienv_core::{Platform, ProvisionPlan};

use crate::commands::ProvisionArgs;
use crate::error::CliError;
use crate::presentation::{BOLD, RESET, print_separator};

pub fn execute(args: &ProvisionArgs, json: bool) -> Result<()> {
    let config = args.to_config().map_err(CliError::from)?;
    let plan = ProvisionPlan::build(&config, Platform::detect()).map_err(CliError::from)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("{BOLD}Variant:{RESET}   {}", plan.variant);
    println!("{BOLD}Toolkit:{RESET}   {}", plan.toolkit);
    println!("{BOLD}Platform:{RESET}  {}", plan.platform);
    println!("{BOLD}Companion:{RESET} {}", plan.companion_requirement);
    println!("{BOLD}Env:{RESET}       {}", config.env_prefix.display());
    println!();
    print_separator(72);
    for (index, step) in plan.steps.iter().enumerate() {
        println!("{:>2}. {}", index + 1, step.description);
        match &step.command.cwd {
            Some(cwd) => println!("    $ {}    (in {})", step.command, cwd.display()),
            None => println!("    $ {}", step.command),
        }
    }
    print_separator(72);
    Ok(())
}
