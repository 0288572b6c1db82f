//! Activated environment handle.
//!
//! Activating an environment in a shell mutates `PATH` and a handful of
//! variables for the rest of the session. Here the same information is a
//! value: every command is run against an explicit [`EnvHandle`], and the
//! parent process environment is never touched.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Name of the search path variable.
pub const PATH_VAR: &str = "PATH";

/// Variables to set and remove for commands run inside an environment.
///
/// An empty prefix describes the host environment (no activation).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvHandle {
    prefix: PathBuf,
    bin_dir: PathBuf,
    vars: BTreeMap<String, String>,
    removed: BTreeSet<String>,
}

impl EnvHandle {
    pub fn new(prefix: impl Into<PathBuf>, bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            bin_dir: bin_dir.into(),
            vars: BTreeMap::new(),
            removed: BTreeSet::new(),
        }
    }

    /// Handle for the host environment with the given search path.
    pub fn host(path: Option<String>) -> Self {
        let handle = Self::default();
        match path {
            Some(path) => handle.with_var(PATH_VAR, path),
            None => handle,
        }
    }

    /// Set a variable; clears any pending removal of the same key.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.removed.remove(&key);
        self.vars.insert(key, value.into());
        self
    }

    /// Remove a variable from child environments; drops any value set for it.
    #[must_use]
    pub fn without_var(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.vars.remove(&key);
        self.removed.insert(key);
        self
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    pub fn is_host(&self) -> bool {
        self.prefix.as_os_str().is_empty()
    }

    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Search path commands resolve programs against.
    pub fn path_var(&self) -> Option<&str> {
        self.var(PATH_VAR)
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.removed.iter().map(String::as_str)
    }

    pub fn is_removed(&self, key: &str) -> bool {
        self.removed.contains(key)
    }
}
