//! Status command handler.

use anyhow::Result;
use std::path::Path;

use cienv_core::ProvisionRecord;

use crate::error::CliError;
use crate::presentation::{BOLD, RESET};

/// Print the provision record stored in `env_prefix`.
pub fn execute(env_prefix: &Path, json: bool) -> Result<()> {
    let path = ProvisionRecord::path_in(env_prefix);
    if !path.is_file() {
        return Err(CliError::NotProvisioned(env_prefix.display().to_string()).into());
    }
    let record = ProvisionRecord::load(&path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!("{BOLD}Environment:{RESET} {}", env_prefix.display());
    println!("  variant     = {}", record.variant);
    println!("  toolkit     = {}", record.toolkit);
    println!("  platform    = {}", record.platform);
    println!("  companion   = {}", record.companion_requirement);
    println!(
        "  provisioned = {}",
        record.provisioned_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  by          = cienv {}", record.tool_version);
    println!("  steps       = {}", record.steps.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::exit_code_for;
    use cienv_core::{Platform, ProvisionConfig, ProvisionPlan};

    #[test]
    fn missing_record_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = execute(dir.path(), false).unwrap_err();
        assert_eq!(exit_code_for(&err), 66);
    }

    #[test]
    fn saved_record_is_shown() {
        let dir = tempfile::TempDir::new().unwrap();
        let plan = ProvisionPlan::build(&ProvisionConfig::new("cu102"), Platform::Linux).unwrap();
        ProvisionRecord::from_plan(&plan, "0.3.0")
            .save(&ProvisionRecord::path_in(dir.path()))
            .unwrap();

        assert!(execute(dir.path(), true).is_ok());
        assert!(execute(dir.path(), false).is_ok());
    }
}
