//! Compiler build information.

use serde::Serialize;

/// Version string baked in at compile time, falling back to the crate version.
const DEFAULT_VERSION: &str = match option_env!("MANIFOLD_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

/// Build information threaded through the pipeline.
///
/// The version ends up in the common label set of every generated object so
/// that deployed resources can be traced back to the compiler that produced
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    /// Compiler version.
    pub version: String,
}

impl BuildInfo {
    /// Create build info with an explicit version.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION)
    }
}
