//! Render configuration.

use manifold_core::labels::{self, Labels};
use manifold_core::{BuildInfo, ServiceMetadata};

/// Default value of the managed-by label.
pub const DEFAULT_MANAGED_BY: &str = "yoke";

/// Settings threaded through every generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Compiler build information.
    pub build: BuildInfo,
    /// Value of the `app.kubernetes.io/managed-by` label.
    pub managed_by: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            build: BuildInfo::default(),
            managed_by: DEFAULT_MANAGED_BY.to_string(),
        }
    }
}

impl RenderConfig {
    /// Create a configuration with an explicit version.
    #[must_use]
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            build: BuildInfo::new(version),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `MANIFOLD_MANAGED_BY`: value of the managed-by label (default: `yoke`)
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("MANIFOLD_MANAGED_BY") {
            if !val.trim().is_empty() {
                config.managed_by = val;
            }
        }

        config
    }

    /// The common label set for a service.
    #[must_use]
    pub fn common_labels(&self, metadata: &ServiceMetadata) -> Labels {
        labels::common_labels(metadata, &self.build, &self.managed_by)
    }

    /// User labels with the common labels applied on top.
    #[must_use]
    pub fn with_common_labels(&self, user: &Labels, metadata: &ServiceMetadata) -> Labels {
        labels::with_common_labels(user, &self.common_labels(metadata))
    }
}
