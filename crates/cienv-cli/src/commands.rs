//! Main commands enum and shared provisioning arguments.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use cienv_core::config::{defaults, keys};
use cienv_core::{ConfigError, ProvisionConfig};

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Provision the environment: install the framework, the companion library and build the project
    Provision {
        #[command(flatten)]
        args: ProvisionArgs,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the steps `provision` would run, without running them
    Plan {
        #[command(flatten)]
        args: ProvisionArgs,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode a compute variant selector
    Resolve {
        /// Selector such as "cpu", "cu92" or "cu113"
        #[arg(env = keys::CU_VERSION)]
        selector: String,
        /// Explicit toolkit version replacing the decoded one (e.g. "10.2")
        #[arg(long = "cuda-toolkit", env = keys::CUDA_TOOLKIT)]
        cuda_toolkit: Option<String>,
    },

    /// Check that the tools the plan needs are available
    CheckDeps {
        #[command(flatten)]
        args: ProvisionArgs,
        /// Check the host PATH instead of the activated environment
        #[arg(long)]
        host: bool,
    },

    /// Show what a provisioned environment holds
    Status {
        /// Environment prefix to inspect
        #[arg(long = "env-prefix", env = keys::ENV_PREFIX, default_value = defaults::ENV_PREFIX)]
        env_prefix: PathBuf,
        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Provisioning options. Every flag can also be set through its
/// environment variable.
#[derive(Args, Debug, Clone, Default)]
pub struct ProvisionArgs {
    /// Compute variant selector ("cpu", "cu92", "cu113", ...)
    #[arg(long, env = keys::CU_VERSION)]
    pub selector: Option<String>,

    /// Prefix of the pre-existing isolated environment
    #[arg(long = "env-prefix", env = keys::ENV_PREFIX)]
    pub env_prefix: Option<String>,

    /// Project working tree
    #[arg(long = "project-dir", env = keys::PROJECT_DIR)]
    pub project_dir: Option<String>,

    /// Explicit CUDA toolkit version replacing the one decoded from the selector
    #[arg(long = "cuda-toolkit", env = keys::CUDA_TOOLKIT)]
    pub cuda_toolkit: Option<String>,

    /// Source repository of the companion library
    #[arg(long = "companion-repo", env = keys::COMPANION_REPO)]
    pub companion_repo: Option<String>,

    /// Revision (tag, branch or commit) of the companion library to install
    #[arg(long = "companion-rev", env = keys::COMPANION_REV)]
    pub companion_rev: Option<String>,

    /// Skip submodule synchronization
    #[arg(
        long = "skip-submodules",
        env = keys::SKIP_SUBMODULES,
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub skip_submodules: Option<String>,
}

impl ProvisionArgs {
    /// Value for a configuration key, as given on the command line or in the environment.
    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            keys::CU_VERSION => self.selector.clone(),
            keys::ENV_PREFIX => self.env_prefix.clone(),
            keys::PROJECT_DIR => self.project_dir.clone(),
            keys::CUDA_TOOLKIT => self.cuda_toolkit.clone(),
            keys::COMPANION_REPO => self.companion_repo.clone(),
            keys::COMPANION_REV => self.companion_rev.clone(),
            keys::SKIP_SUBMODULES => self.skip_submodules.clone(),
            _ => None,
        }
    }

    /// Build the provisioning configuration.
    pub fn to_config(&self) -> Result<ProvisionConfig, ConfigError> {
        ProvisionConfig::from_lookup(|key| self.lookup(key))
    }
}
