//! Operating system family of the provisioning host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kernel name (`uname -s`) of the compile target.
pub const TARGET_KERNEL_NAME: &str = if cfg!(target_os = "macos") {
    "Darwin"
} else if cfg!(target_os = "windows") {
    "Windows_NT"
} else if cfg!(target_os = "freebsd") {
    "FreeBSD"
} else {
    "Linux"
};

/// OS family label, as used in installer artifact names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "MacOSX")]
    MacOsx,
    Linux,
}

impl Platform {
    /// Map a kernel name (`uname -s`) to a platform.
    ///
    /// Anything that is not a Darwin kernel is treated as Linux.
    pub fn from_kernel_name(name: &str) -> Self {
        if name.trim_start().starts_with("Darwin") {
            Self::MacOsx
        } else {
            Self::Linux
        }
    }

    /// Platform of the running binary.
    ///
    /// The compile target's kernel name stands in for `uname -s`, which
    /// cannot differ from it for a native binary.
    pub fn detect() -> Self {
        Self::from_kernel_name(TARGET_KERNEL_NAME)
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::MacOsx => "MacOSX",
            Self::Linux => "Linux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn darwin_maps_to_macosx() {
        assert_eq!(Platform::from_kernel_name("Darwin"), Platform::MacOsx);
        assert_eq!(Platform::from_kernel_name("Darwin\n"), Platform::MacOsx);
        assert_eq!(Platform::MacOsx.label(), "MacOSX");
    }

    #[test]
    fn everything_else_maps_to_linux() {
        for name in ["Linux", "FreeBSD", "MINGW64_NT-10.0", ""] {
            assert_eq!(Platform::from_kernel_name(name), Platform::Linux, "{name}");
        }
    }

    #[test]
    fn detect_matches_target_os() {
        let expected = if cfg!(target_os = "macos") {
            Platform::MacOsx
        } else {
            Platform::Linux
        };
        assert_eq!(Platform::detect(), expected);
        assert_eq!(Platform::detect(), Platform::from_kernel_name(TARGET_KERNEL_NAME));
    }
}
