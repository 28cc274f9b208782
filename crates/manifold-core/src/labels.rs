//! The common label set stamped on every generated object.

use std::collections::BTreeMap;

use crate::build::BuildInfo;
use crate::metadata::ServiceMetadata;

/// Ordered string map used for labels, annotations and selectors.
pub type Labels = BTreeMap<String, String>;

/// Label carrying the compiler version.
pub const VERSION_LABEL: &str = "manifold-version";

/// Label naming the tool that manages the objects.
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Build the common label set for a service.
#[must_use]
pub fn common_labels(metadata: &ServiceMetadata, build: &BuildInfo, managed_by: &str) -> Labels {
    [
        ("app", metadata.service_id().to_string()),
        ("namespace", metadata.namespace.clone()),
        ("service", metadata.service.clone()),
        ("component", metadata.component.clone()),
        ("environment", metadata.environment.clone()),
        (VERSION_LABEL, build.version.clone()),
        (MANAGED_BY_LABEL, managed_by.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Layer `overlay` on top of `base`; keys present in both take the overlay value.
#[must_use]
pub fn merged(base: &Labels, overlay: &Labels) -> Labels {
    let mut out = base.clone();
    out.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
    out
}

/// User labels with the common labels applied on top.
///
/// Common labels always win so that selectors keep matching.
#[must_use]
pub fn with_common_labels(labels: &Labels, common: &Labels) -> Labels {
    merged(labels, common)
}
