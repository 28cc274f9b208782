//! Arbitrary manifests, emitted as written.

use crate::config::RenderConfig;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::values::DeploymentValues;

pub(super) fn applies(values: &DeploymentValues) -> bool {
    !values.extra_manifests.is_empty()
}

pub(super) fn generate(values: &DeploymentValues, _: &RenderConfig) -> Result<Vec<Manifest>> {
    Ok(values
        .extra_manifests
        .iter()
        .cloned()
        .map(Manifest::from_map)
        .collect())
}
