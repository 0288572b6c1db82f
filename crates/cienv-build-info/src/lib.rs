//! Build/version metadata for the `cienv` binary.

/// The `SemVer` version of the build (from Cargo).
pub const SEMVER: &str = env!("CARGO_PKG_VERSION");

/// The short git SHA emitted by the build script, or `"unknown"`.
pub const GIT_SHA_SHORT: &str = env!("VERGEN_GIT_SHA");

/// True if the git SHA looks like a short hex hash.
pub const HAS_GIT_SHA: bool = is_short_hex(GIT_SHA_SHORT);

const LONG_VERSION_WITH_SHA: &str =
    concat!(env!("CARGO_PKG_VERSION"), " (", env!("VERGEN_GIT_SHA"), ")");

/// Version string used by `cienv --version`.
///
/// `0.3.0 (a1b2c3d)` when git data was available at build time, `0.3.0` otherwise.
pub const LONG_VERSION: &str = if HAS_GIT_SHA {
    LONG_VERSION_WITH_SHA
} else {
    SEMVER
};

const fn is_short_hex(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 7 {
        return false;
    }

    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_hexdigit() {
            return false;
        }
        i += 1;
    }
    true
}
