//! Resolve command handler.

use anyhow::Result;

use cienv_core::plan::resolve_toolkit;
use cienv_core::{ComputeVariant, CudaVersion};

use crate::error::CliError;

/// Decoded selector, as printed by `cienv resolve`.
#[derive(Debug, PartialEq, Eq)]
pub struct Resolution {
    pub variant: ComputeVariant,
    pub version: Option<CudaVersion>,
    pub toolkit: String,
}

/// Decode `selector`, applying an optional toolkit override.
pub fn resolve(selector: &str, cuda_toolkit: Option<&str>) -> Result<Resolution, CliError> {
    let variant = ComputeVariant::parse(selector)?;
    let override_version = cuda_toolkit.map(CudaVersion::from_dotted).transpose()?;
    Ok(Resolution {
        variant,
        version: variant.cuda_version(),
        toolkit: resolve_toolkit(variant, override_version),
    })
}

pub fn execute(selector: &str, cuda_toolkit: Option<&str>) -> Result<()> {
    let resolution = resolve(selector, cuda_toolkit)?;

    println!("variant = {}", resolution.variant);
    match resolution.version {
        Some(version) => println!("version = {version}"),
        None => println!("version = none"),
    }
    println!("toolkit = {}", resolution.toolkit);
    Ok(())
}
