//! Compute variant selection.
//!
//! A selector is either the literal `cpu` or a compact CUDA code such as
//! `cu92` or `cu113`. Compact codes are decoded from fixed character
//! offsets; the characters before offset 2 are not inspected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Selector value for CPU-only builds.
pub const CPU_SELECTOR: &str = "cpu";

/// Package constraint used for CPU-only builds.
pub const CPU_TOOLKIT: &str = "cpuonly";

/// Errors produced while resolving a compute variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariantError {
    /// No selector was provided
    #[error("compute variant selector is empty; use \"cpu\" or a CUDA code like \"cu113\"")]
    Empty,

    /// Selector is neither `cpu` nor a 4/5 character CUDA code
    #[error(
        "unsupported compute variant selector {selector:?} ({len} characters); expected \"cpu\" or a 4/5 character CUDA code like \"cu92\" or \"cu113\""
    )]
    UnsupportedLength { selector: String, len: usize },

    /// Version characters of the selector are not decimal digits
    #[error("compute variant selector {selector:?} does not contain a numeric CUDA version")]
    NotNumeric { selector: String },

    /// A dotted version string could not be reduced to `major.minor`
    #[error("invalid CUDA version {value:?}; expected <major>.<minor>")]
    InvalidVersion { value: String },
}

/// A CUDA toolkit version reduced to its two significant components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CudaVersion {
    pub major: u32,
    pub minor: u32,
}

impl CudaVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Decode a compact selector code.
    ///
    /// - 4 characters: `code[2] . code[3]` (`cu92` -> `9.2`)
    /// - 5 characters: `code[2..4] . code[4]` (`cu102` -> `10.2`)
    pub fn from_compact(code: &str) -> Result<Self, VariantError> {
        if code.is_empty() {
            return Err(VariantError::Empty);
        }
        if !code.is_ascii() {
            return Err(VariantError::NotNumeric {
                selector: code.to_string(),
            });
        }

        let (major, minor) = match code.len() {
            4 => (&code[2..3], &code[3..4]),
            5 => (&code[2..4], &code[4..5]),
            len => {
                return Err(VariantError::UnsupportedLength {
                    selector: code.to_string(),
                    len,
                });
            }
        };

        if !is_digits(major) || !is_digits(minor) {
            return Err(VariantError::NotNumeric {
                selector: code.to_string(),
            });
        }

        Self::from_dotted(&format!("{major}.{minor}"))
    }

    /// Parse a dotted version, keeping only the first two fields.
    ///
    /// `11.3.1` parses as `11.3`; a single field is rejected.
    pub fn from_dotted(value: &str) -> Result<Self, VariantError> {
        let invalid = || VariantError::InvalidVersion {
            value: value.to_string(),
        };

        let mut fields = value.trim().split('.');
        let major = fields.next().filter(|f| is_digits(f)).ok_or_else(invalid)?;
        let minor = fields.next().filter(|f| is_digits(f)).ok_or_else(invalid)?;

        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for CudaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for CudaVersion {
    type Err = VariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_dotted(s)
    }
}

/// Build target selected for the framework install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeVariant {
    /// CPU-only build
    Cpu,
    /// GPU build against a specific CUDA toolkit
    Cuda(CudaVersion),
}

impl ComputeVariant {
    /// Resolve a selector such as `cpu`, `cu92` or `cu113`.
    pub fn parse(selector: &str) -> Result<Self, VariantError> {
        let selector = selector.trim();
        if selector == CPU_SELECTOR {
            return Ok(Self::Cpu);
        }
        CudaVersion::from_compact(selector).map(Self::Cuda)
    }

    pub const fn is_cpu(&self) -> bool {
        matches!(self, Self::Cpu)
    }

    pub const fn cuda_version(&self) -> Option<CudaVersion> {
        match self {
            Self::Cpu => None,
            Self::Cuda(version) => Some(*version),
        }
    }

    /// Package-manager constraint embedding this variant.
    pub fn toolkit_constraint(&self) -> String {
        match self {
            Self::Cpu => CPU_TOOLKIT.to_string(),
            Self::Cuda(version) => cuda_toolkit_constraint(*version),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Self::Cpu => "CPU".to_string(),
            Self::Cuda(version) => format!("CUDA {version}"),
        }
    }
}

impl fmt::Display for ComputeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl FromStr for ComputeVariant {
    type Err = VariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// `cudatoolkit=<major>.<minor>`
pub fn cuda_toolkit_constraint(version: CudaVersion) -> String {
    format!("cudatoolkit={version}")
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_selector_selects_cpu_branch() {
        let variant = ComputeVariant::parse("cpu").unwrap();
        assert_eq!(variant, ComputeVariant::Cpu);
        assert!(variant.is_cpu());
        assert_eq!(variant.toolkit_constraint(), "cpuonly");
        assert_eq!(variant.cuda_version(), None);
    }

    #[test]
    fn cpu_selector_tolerates_surrounding_whitespace() {
        assert_eq!(ComputeVariant::parse(" cpu\n").unwrap(), ComputeVariant::Cpu);
    }

    #[test]
    fn cpu_selector_is_case_sensitive() {
        // "CPU" has three characters and is not the cpu literal
        assert!(matches!(
            ComputeVariant::parse("CPU"),
            Err(VariantError::UnsupportedLength { len: 3, .. })
        ));
    }

    #[test]
    fn four_character_code_uses_single_digit_major() {
        assert_eq!(
            CudaVersion::from_compact("cu92").unwrap(),
            CudaVersion::new(9, 2)
        );
        assert_eq!(
            ComputeVariant::parse("cu92").unwrap().toolkit_constraint(),
            "cudatoolkit=9.2"
        );
    }

    #[test]
    fn five_character_code_uses_two_digit_major() {
        assert_eq!(
            CudaVersion::from_compact("cu102").unwrap(),
            CudaVersion::new(10, 2)
        );
        assert_eq!(
            CudaVersion::from_compact("cu113").unwrap(),
            CudaVersion::new(11, 3)
        );
    }

    #[test]
    fn offsets_ignore_the_prefix_characters() {
        assert_eq!(
            CudaVersion::from_compact("1130").unwrap(),
            CudaVersion::new(3, 0)
        );
        assert_eq!(
            CudaVersion::from_compact("11300").unwrap(),
            CudaVersion::new(30, 0)
        );
    }

    #[test]
    fn unsupported_lengths_fail_loudly() {
        for selector in ["cu1", "cu1180", "gpu", "c"] {
            let err = ComputeVariant::parse(selector).unwrap_err();
            assert!(
                matches!(err, VariantError::UnsupportedLength { .. }),
                "{selector}: {err:?}"
            );
        }
    }

    #[test]
    fn empty_selector_is_rejected() {
        assert_eq!(ComputeVariant::parse(""), Err(VariantError::Empty));
        assert_eq!(ComputeVariant::parse("   "), Err(VariantError::Empty));
    }

    #[test]
    fn non_numeric_version_characters_are_rejected() {
        assert!(matches!(
            ComputeVariant::parse("cuxy"),
            Err(VariantError::NotNumeric { .. })
        ));
        assert!(matches!(
            ComputeVariant::parse("cu1.2"),
            Err(VariantError::NotNumeric { .. })
        ));
    }

    #[test]
    fn non_ascii_selector_does_not_panic() {
        assert!(matches!(
            ComputeVariant::parse("cué1"),
            Err(VariantError::NotNumeric { .. })
        ));
    }

    #[test]
    fn dotted_version_truncates_to_two_fields() {
        assert_eq!(
            CudaVersion::from_dotted("11.3.1").unwrap(),
            CudaVersion::new(11, 3)
        );
        assert_eq!("10.2".parse::<CudaVersion>().unwrap(), CudaVersion::new(10, 2));
        assert!(CudaVersion::from_dotted("11").is_err());
        assert!(CudaVersion::from_dotted("11.").is_err());
        assert!(CudaVersion::from_dotted("a.b").is_err());
    }

    #[test]
    fn display_names() {
        assert_eq!(ComputeVariant::Cpu.to_string(), "CPU");
        assert_eq!(
            ComputeVariant::Cuda(CudaVersion::new(11, 3)).to_string(),
            "CUDA 11.3"
        );
    }

    #[test]
    fn serializes_as_tagged_value() {
        let json = serde_json::to_string(&ComputeVariant::Cuda(CudaVersion::new(10, 2))).unwrap();
        assert_eq!(json, r#"{"cuda":{"major":10,"minor":2}}"#);
        assert_eq!(serde_json::to_string(&ComputeVariant::Cpu).unwrap(), r#""cpu""#);
    }
}
