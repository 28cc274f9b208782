//! One `ConfigMap` per declared map.

use k8s_openapi::api::core::v1::ConfigMap;
use manifold_core::{names, Labels};

use super::object_meta;
use crate::config::RenderConfig;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::values::DeploymentValues;

pub(super) fn applies(values: &DeploymentValues) -> bool {
    !values.config_maps.is_empty()
}

pub(super) fn generate(values: &DeploymentValues, config: &RenderConfig) -> Result<Vec<Manifest>> {
    values
        .config_maps
        .iter()
        .map(|(name, data)| {
            let map = ConfigMap {
                metadata: object_meta(
                    names::config_map_name(&values.service_id, name),
                    values,
                    config.common_labels(&values.metadata),
                    Labels::new(),
                ),
                data: Some(data.clone()),
                ..Default::default()
            };
            Manifest::from_resource(&map)
        })
        .collect()
}
