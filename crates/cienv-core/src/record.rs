//! Provision record storage.
//!
//! After a successful run a record is written into the environment prefix
//! so later jobs (and `cienv status`) can tell what the environment holds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::plan::{ProvisionPlan, StepKind};
use crate::platform::Platform;
use crate::variant::ComputeVariant;

/// File name of the record inside the environment prefix.
pub const RECORD_FILE_NAME: &str = "cienv-record.json";

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to access provision record {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse provision record {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize provision record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What a successful provisioning run installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionRecord {
    pub variant: ComputeVariant,
    pub toolkit: String,
    pub platform: Platform,
    pub companion_requirement: String,
    pub steps: Vec<StepKind>,
    pub provisioned_at: DateTime<Utc>,
    /// Version of cienv that performed the run.
    pub tool_version: String,
}

impl ProvisionRecord {
    pub fn from_plan(plan: &ProvisionPlan, tool_version: impl Into<String>) -> Self {
        Self {
            variant: plan.variant,
            toolkit: plan.toolkit.clone(),
            platform: plan.platform,
            companion_requirement: plan.companion_requirement.clone(),
            steps: plan.steps.iter().map(|s| s.kind).collect(),
            provisioned_at: Utc::now(),
            tool_version: tool_version.into(),
        }
    }

    /// Location of the record for an environment prefix.
    pub fn path_in(prefix: &Path) -> PathBuf {
        prefix.join(RECORD_FILE_NAME)
    }

    pub fn save(&self, path: &Path) -> Result<(), RecordError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| RecordError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, RecordError> {
        let json = fs::read_to_string(path).map_err(|source| RecordError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| RecordError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvisionConfig;
    use tempfile::tempdir;

    #[test]
    fn record_survives_save_and_load() {
        let dir = tempdir().unwrap();
        let plan = ProvisionPlan::build(
            &ProvisionConfig::new("cu102").with_companion_revision("abc123"),
            Platform::Linux,
        )
        .unwrap();

        let original = ProvisionRecord::from_plan(&plan, "0.3.0");
        let path = ProvisionRecord::path_in(dir.path());
        original.save(&path).unwrap();

        let loaded = ProvisionRecord::load(&path).unwrap();
        assert_eq!(loaded, original);
        assert_eq!(loaded.toolkit, "cudatoolkit=10.2");
        assert!(loaded.companion_requirement.ends_with("@abc123"));
    }

    #[test]
    fn missing_record_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(RECORD_FILE_NAME);
        let err = ProvisionRecord::load(&path).unwrap_err();
        assert!(matches!(err, RecordError::Io { .. }));
        assert!(err.to_string().contains(RECORD_FILE_NAME));
    }

    #[test]
    fn corrupt_record_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(RECORD_FILE_NAME);
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            ProvisionRecord::load(&path),
            Err(RecordError::Parse { .. })
        ));
    }
}
