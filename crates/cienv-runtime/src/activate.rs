//! Environment activation.
//!
//! Produces an [`EnvHandle`] for a pre-existing environment prefix instead
//! of sourcing an activation hook into the current process.

use cienv_core::EnvHandle;
use cienv_core::env::PATH_VAR;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ProvisionError, ProvisionResult};

pub const CONDA_PREFIX: &str = "CONDA_PREFIX";
pub const CONDA_DEFAULT_ENV: &str = "CONDA_DEFAULT_ENV";

/// Activate the environment at `prefix`.
///
/// The prefix must be a directory with a `bin/` holding an interpreter or
/// sitting next to `conda-meta/`. On Windows the `Scripts/` layout is
/// accepted instead.
/// The returned handle prepends the environment's binary directories to
/// `inherited_path`, points `CONDA_PREFIX` at the prefix and removes every
/// variable in `stale_vars`.
pub fn activate(
    prefix: &Path,
    stale_vars: &[String],
    inherited_path: Option<&OsStr>,
) -> ProvisionResult<EnvHandle> {
    if !prefix.is_dir() {
        return Err(ProvisionError::environment_missing(
            prefix,
            "directory does not exist",
        ));
    }

    let prefix = prefix
        .canonicalize()
        .unwrap_or_else(|_| prefix.to_path_buf());
    let layout = EnvLayout::detect(&prefix).ok_or_else(|| {
        ProvisionError::environment_missing(
            &prefix,
            "no conda-meta directory or Python interpreter found",
        )
    })?;

    let inherited = inherited_path
        .map(|p| std::env::split_paths(p).collect::<Vec<_>>())
        .unwrap_or_default();
    let search_path = std::env::join_paths(layout.path_entries.iter().chain(inherited.iter()))
        .map_err(|e| ProvisionError::environment_missing(&prefix, e.to_string()))?;

    let prefix_str = prefix.to_string_lossy().into_owned();
    let mut handle = EnvHandle::new(&prefix, &layout.bin_dir)
        .with_var(PATH_VAR, search_path.to_string_lossy())
        .with_var(CONDA_PREFIX, prefix_str.clone())
        .with_var(CONDA_DEFAULT_ENV, prefix_str);

    for var in stale_vars {
        debug!(var = %var, "Clearing stale variable");
        handle = handle.without_var(var.as_str());
    }

    debug!(prefix = %prefix.display(), bin = %layout.bin_dir.display(), "Environment activated");
    Ok(handle)
}

/// Activate against the current process `PATH`.
pub fn activate_from_process(prefix: &Path, stale_vars: &[String]) -> ProvisionResult<EnvHandle> {
    let path = std::env::var_os(PATH_VAR);
    activate(prefix, stale_vars, path.as_deref())
}

/// Handle for running commands on the host, without activation.
pub fn host_env() -> EnvHandle {
    EnvHandle::host(std::env::var(PATH_VAR).ok())
}

struct EnvLayout {
    bin_dir: PathBuf,
    path_entries: Vec<PathBuf>,
}

impl EnvLayout {
    fn detect(prefix: &Path) -> Option<Self> {
        let has_meta = prefix.join("conda-meta").is_dir();

        // Unix layout
        let bin = prefix.join("bin");
        if bin.join("python").exists() || (has_meta && bin.is_dir()) {
            return Some(Self {
                path_entries: vec![bin.clone()],
                bin_dir: bin,
            });
        }

        // Windows layout: interpreter at the root, tools under Scripts
        if !cfg!(windows) {
            return None;
        }
        let scripts = prefix.join("Scripts");
        if prefix.join("python.exe").exists()
            || scripts.join("python.exe").exists()
            || (has_meta && scripts.is_dir())
        {
            return Some(Self {
                path_entries: vec![
                    prefix.to_path_buf(),
                    prefix.join("Library").join("bin"),
                    scripts.clone(),
                ],
                bin_dir: scripts,
            });
        }

        None
    }
}
