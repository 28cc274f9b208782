//! Claims for every newly provisioned persistent volume.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use manifold_core::{names, Labels};
use manifold_schema::NewClaim;

use super::object_meta;
use crate::config::RenderConfig;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::values::DeploymentValues;

const DEFAULT_ACCESS_MODE: &str = "ReadWriteOnce";
const DEFAULT_VOLUME_MODE: &str = "Filesystem";

pub(super) fn applies(values: &DeploymentValues) -> bool {
    new_claims(values).next().is_some()
}

pub(super) fn generate(values: &DeploymentValues, config: &RenderConfig) -> Result<Vec<Manifest>> {
    new_claims(values)
        .map(|(name, claim)| {
            let access_modes = if claim.access_modes.is_empty() {
                vec![DEFAULT_ACCESS_MODE.to_string()]
            } else {
                claim.access_modes.clone()
            };
            let pvc = PersistentVolumeClaim {
                metadata: object_meta(
                    names::pvc_name(&values.service_id, name),
                    values,
                    config.common_labels(&values.metadata),
                    Labels::new(),
                ),
                spec: Some(PersistentVolumeClaimSpec {
                    access_modes: Some(access_modes),
                    volume_mode: Some(
                        claim
                            .volume_mode
                            .clone()
                            .unwrap_or_else(|| DEFAULT_VOLUME_MODE.to_string()),
                    ),
                    resources: Some(VolumeResourceRequirements {
                        requests: Some(BTreeMap::from([(
                            "storage".to_string(),
                            claim.size.clone(),
                        )])),
                        ..Default::default()
                    }),
                    storage_class_name: Some(claim.storage_class_name.clone()),
                    ..Default::default()
                }),
                ..Default::default()
            };
            Manifest::from_resource(&pvc)
        })
        .collect()
}

/// New claims of every pod, each pod's volumes in name order.
fn new_claims(values: &DeploymentValues) -> impl Iterator<Item = (&str, &NewClaim)> {
    values.all_volumes().into_iter().flat_map(|volumes| {
        volumes
            .iter()
            .filter_map(|(name, volume)| Some((name.as_str(), volume.new_claim()?)))
    })
}
