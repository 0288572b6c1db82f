//! Provisioning configuration.
//!
//! Configuration is an explicit value built from a key lookup, so callers
//! (and tests) never need to mutate the process environment. The CLI feeds
//! its flags (each backed by the same variable) through
//! [`ProvisionConfig::from_lookup`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::variant::{ComputeVariant, CudaVersion, VariantError};

/// Environment variable names read by [`ProvisionConfig::from_lookup`].
pub mod keys {
    /// Compute variant selector (`cpu`, `cu92`, `cu113`, ...)
    pub const CU_VERSION: &str = "CU_VERSION";
    pub const ENV_PREFIX: &str = "CIENV_ENV_PREFIX";
    pub const PROJECT_DIR: &str = "CIENV_PROJECT_DIR";
    pub const CUDA_TOOLKIT: &str = "CIENV_CUDA_TOOLKIT";
    pub const COMPANION_REPO: &str = "CIENV_COMPANION_REPO";
    pub const COMPANION_REV: &str = "CIENV_COMPANION_REV";
    pub const SKIP_SUBMODULES: &str = "CIENV_SKIP_SUBMODULES";
}

/// Built-in defaults for the nightly framework + companion library layout.
pub mod defaults {
    pub const ENV_PREFIX: &str = "./env";
    pub const PROJECT_DIR: &str = ".";
    pub const PYTHON: &str = "python";
    pub const PIP: &str = "pip";
    pub const CONDA: &str = "conda";
    pub const GIT: &str = "git";

    /// Version pins that would override nightly channel resolution.
    pub const STALE_VARS: &[&str] = &["PYTORCH_VERSION"];

    pub const FRAMEWORK_PIP_NAME: &str = "torch";
    pub const FRAMEWORK_CONDA_NAME: &str = "pytorch";
    pub const CPU_NIGHTLY_INDEX: &str =
        "https://download.pytorch.org/whl/nightly/cpu/torch_nightly.html";
    pub const NIGHTLY_CHANNEL: &str = "pytorch-nightly";

    pub const BUILD_HELPER: &str = "ninja";
    pub const COMPANION_REPO: &str = "https://github.com/pytorch-labs/tensordict";
    pub const COMPANION_MODULE: &str = "tensordict";

    pub const PROJECT_MODULE: &str = "torchrl";
    pub const PROJECT_BUILD_ARGS: &[&str] = &["setup.py", "develop"];
}

/// Errors raised while reading configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Where and how the deep-learning framework is installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkSpec {
    /// Package name on the package index (CPU branch).
    pub pip_name: String,
    /// Package name on the environment package manager (GPU branch).
    pub conda_name: String,
    /// Find-links page listing the CPU nightly wheels.
    pub cpu_index_url: String,
    /// Channel carrying the GPU nightly builds.
    pub nightly_channel: String,
}

impl Default for FrameworkSpec {
    fn default() -> Self {
        Self {
            pip_name: defaults::FRAMEWORK_PIP_NAME.to_string(),
            conda_name: defaults::FRAMEWORK_CONDA_NAME.to_string(),
            cpu_index_url: defaults::CPU_NIGHTLY_INDEX.to_string(),
            nightly_channel: defaults::NIGHTLY_CHANNEL.to_string(),
        }
    }
}

/// Companion library installed from source control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionSpec {
    pub repo_url: String,
    /// Pinned revision; `None` installs the default branch head.
    pub revision: Option<String>,
    /// Module imported by the smoke test.
    pub module: String,
    /// Build acceleration package installed before the companion.
    pub build_helper: String,
}

impl CompanionSpec {
    /// `git+<repo>` or `git+<repo>@<rev>`
    pub fn pip_requirement(&self) -> String {
        match self.revision.as_deref() {
            Some(rev) => format!("git+{}@{}", self.repo_url, rev),
            None => format!("git+{}", self.repo_url),
        }
    }

    pub const fn is_pinned(&self) -> bool {
        self.revision.is_some()
    }
}

impl Default for CompanionSpec {
    fn default() -> Self {
        Self {
            repo_url: defaults::COMPANION_REPO.to_string(),
            revision: None,
            module: defaults::COMPANION_MODULE.to_string(),
            build_helper: defaults::BUILD_HELPER.to_string(),
        }
    }
}

/// The project being built in development mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub dir: PathBuf,
    /// Module imported by the smoke test.
    pub module: String,
    /// Arguments passed to the interpreter to build/install in place.
    pub build_args: Vec<String>,
    pub sync_submodules: bool,
}

impl Default for ProjectSpec {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(defaults::PROJECT_DIR),
            module: defaults::PROJECT_MODULE.to_string(),
            build_args: defaults::PROJECT_BUILD_ARGS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            sync_submodules: true,
        }
    }
}

/// Full provisioning configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// Raw compute variant selector.
    pub selector: String,
    /// Prefix of the pre-existing isolated environment.
    pub env_prefix: PathBuf,
    pub python: String,
    pub pip: String,
    pub conda: String,
    pub git: String,
    /// Variables removed from every child command's environment.
    pub stale_vars: Vec<String>,
    /// Explicit toolkit version replacing the one parsed from the selector.
    pub cuda_toolkit: Option<String>,
    pub framework: FrameworkSpec,
    pub companion: CompanionSpec,
    pub project: ProjectSpec,
}

impl ProvisionConfig {
    /// Create a configuration with defaults for everything but the selector.
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            env_prefix: PathBuf::from(defaults::ENV_PREFIX),
            python: defaults::PYTHON.to_string(),
            pip: defaults::PIP.to_string(),
            conda: defaults::CONDA.to_string(),
            git: defaults::GIT.to_string(),
            stale_vars: defaults::STALE_VARS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            cuda_toolkit: None,
            framework: FrameworkSpec::default(),
            companion: CompanionSpec::default(),
            project: ProjectSpec::default(),
        }
    }

    /// Build a configuration from a key lookup.
    ///
    /// Unset or blank values fall back to defaults. A missing selector is
    /// kept empty and rejected when the variant is resolved.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::new(get(keys::CU_VERSION).unwrap_or_default());

        if let Some(prefix) = get(keys::ENV_PREFIX) {
            config.env_prefix = PathBuf::from(prefix);
        }
        if let Some(dir) = get(keys::PROJECT_DIR) {
            config.project.dir = PathBuf::from(dir);
        }
        if let Some(toolkit) = get(keys::CUDA_TOOLKIT) {
            CudaVersion::from_dotted(&toolkit).map_err(|e| ConfigError::InvalidValue {
                key: keys::CUDA_TOOLKIT.to_string(),
                value: toolkit.clone(),
                reason: e.to_string(),
            })?;
            config.cuda_toolkit = Some(toolkit);
        }
        if let Some(repo) = get(keys::COMPANION_REPO) {
            config.companion.repo_url = repo;
        }
        config.companion.revision = get(keys::COMPANION_REV);
        if let Some(raw) = get(keys::SKIP_SUBMODULES) {
            config.project.sync_submodules = !parse_flag(keys::SKIP_SUBMODULES, &raw)?;
        }

        Ok(config)
    }

    /// Build a configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project.dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_cuda_toolkit(mut self, toolkit: impl Into<String>) -> Self {
        self.cuda_toolkit = Some(toolkit.into());
        self
    }

    #[must_use]
    pub fn with_companion_repo(mut self, repo: impl Into<String>) -> Self {
        self.companion.repo_url = repo.into();
        self
    }

    #[must_use]
    pub fn with_companion_revision(mut self, rev: impl Into<String>) -> Self {
        self.companion.revision = Some(rev.into());
        self
    }

    #[must_use]
    pub const fn without_submodules(mut self) -> Self {
        self.project.sync_submodules = false;
        self
    }

    /// Resolve the compute variant from the selector.
    pub fn variant(&self) -> Result<ComputeVariant, VariantError> {
        ComputeVariant::parse(&self.selector)
    }

    /// Parsed toolkit override, if one is configured.
    pub fn toolkit_override(&self) -> Result<Option<CudaVersion>, VariantError> {
        self.cuda_toolkit
            .as_deref()
            .map(CudaVersion::from_dotted)
            .transpose()
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            reason: "expected a boolean (true/false, 1/0, yes/no, on/off)".to_string(),
        }),
    }
}
