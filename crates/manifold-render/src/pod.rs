//! Pod assembly shared by the workload, the pre-deployment job and cronjobs.

use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, EmptyDirVolumeSource, KeyToPath, LocalObjectReference,
    PersistentVolumeClaimVolumeSource, PodSpec, SecretVolumeSource, Volume as K8sVolume,
};
use manifold_core::{names, ServiceId};
use manifold_schema::{PersistentVolume, ProjectedVolume, Volume, VolumeSource};

use crate::container::{build_container, non_empty};
use crate::error::{RenderError, Result};
use crate::values::PodValues;

/// File mode of projected files unless the volume sets one.
pub const DEFAULT_PROJECTION_MODE: i32 = 0o444;

/// Medium of memory-backed scratch volumes.
const MEMORY_MEDIUM: &str = "Memory";

/// Build the pod spec for one container host.
///
/// The restart policy is left to the caller.
///
/// # Errors
///
/// Returns [`RenderError::InvalidVolume`] if a raw volume does not form a
/// platform volume.
pub fn build_pod_spec(pod: &PodValues<'_>) -> Result<PodSpec> {
    let image_pull_secrets = pod
        .pull_secrets()
        .into_iter()
        .map(|name| LocalObjectReference {
            name: name.to_string(),
        })
        .collect();

    Ok(PodSpec {
        image_pull_secrets: non_empty(image_pull_secrets),
        init_containers: non_empty(
            pod.init_containers
                .iter()
                .map(|c| build_container(c, pod))
                .collect(),
        ),
        containers: pod.containers.iter().map(|c| build_container(c, pod)).collect(),
        service_account_name: Some(pod.service_id.to_string()),
        node_selector: (!pod.node_selector.is_empty()).then(|| pod.node_selector.clone()),
        affinity: pod.affinity.cloned(),
        tolerations: non_empty(pod.tolerations.to_vec()),
        volumes: non_empty(build_volumes(pod)?),
        ..Default::default()
    })
}

/// Platform volumes for every pod volume, sorted by name.
///
/// # Errors
///
/// Returns [`RenderError::InvalidVolume`] if a raw volume does not decode.
pub fn build_volumes(pod: &PodValues<'_>) -> Result<Vec<K8sVolume>> {
    pod.volumes
        .iter()
        .map(|(name, volume)| build_volume(name, volume, pod.service_id))
        .collect()
}

fn build_volume(name: &str, volume: &Volume, service_id: &ServiceId) -> Result<K8sVolume> {
    let base = K8sVolume {
        name: name.to_string(),
        ..Default::default()
    };
    let volume = match &volume.source {
        VolumeSource::Secret(projected) => K8sVolume {
            secret: Some(SecretVolumeSource {
                secret_name: Some(projected.name.clone()),
                default_mode: Some(projected.mode.unwrap_or(DEFAULT_PROJECTION_MODE)),
                items: Some(key_to_paths(projected)),
                ..Default::default()
            }),
            ..base
        },
        VolumeSource::ConfigMap(projected) => K8sVolume {
            config_map: Some(ConfigMapVolumeSource {
                name: projected.name.clone(),
                default_mode: Some(projected.mode.unwrap_or(DEFAULT_PROJECTION_MODE)),
                items: Some(key_to_paths(projected)),
                ..Default::default()
            }),
            ..base
        },
        VolumeSource::Raw(raw) => raw.to_volume(name).map_err(|e| RenderError::InvalidVolume {
            volume: name.to_string(),
            reason: e.to_string(),
        })?,
        VolumeSource::Persistent(persistent) => {
            let claim_name = match persistent {
                PersistentVolume::Existing { pvc_name } => pvc_name.clone(),
                PersistentVolume::New(_) => names::pvc_name(service_id, name),
            };
            K8sVolume {
                persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                    claim_name,
                    ..Default::default()
                }),
                ..base
            }
        }
        VolumeSource::Tmpfs => K8sVolume {
            empty_dir: Some(EmptyDirVolumeSource {
                medium: Some(MEMORY_MEDIUM.to_string()),
                ..Default::default()
            }),
            ..base
        },
        VolumeSource::Local => K8sVolume {
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..base
        },
    };
    Ok(volume)
}

/// Projected items sorted by path; a missing key means the path itself.
fn key_to_paths(projected: &ProjectedVolume) -> Vec<KeyToPath> {
    projected
        .items
        .iter()
        .map(|(path, key)| KeyToPath {
            key: key.clone().unwrap_or_else(|| path.clone()),
            path: path.clone(),
            ..Default::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::prepare_values;
    use manifold_schema::parse_values;

    const DOC: &str = "
namespace: apps
service: foo
component: bar
environment: test
image:
  repository: registry/foo
  tag: v1
  pullSecrets: [regcred, shared]
ports:
  - port: 8080
sidecars:
  proxy:
    image:
      repository: envoy
      tag: v2
      pullSecrets: [shared, other]
nodeSelector:
  pool: general
volumes:
  zz-scratch:
    type: tmpfs
    mounts:
      main: {containerPath: /scratch}
  data:
    type: persistent
    existing: false
    size: 1Gi
    storageClassName: fast
    mounts:
      main: {containerPath: /data}
  legacy:
    type: persistent
    existing: true
    pvcName: old-claim
    mounts:
      main: {containerPath: /legacy}
  certs:
    type: secret
    secretName: tls
    items:
      tls.crt:
      ca: ca.crt
    mounts:
      proxy: {containerPath: /certs}
  settings:
    type: configMap
    configMapName: settings
    mode: 420
    mounts:
      main: {containerPath: /etc/settings}
  cache:
    type: local
    mounts:
      main: {containerPath: /cache}
  host:
    type: raw
    spec:
      hostPath:
        path: /var/run
    mounts:
      main: {containerPath: /host}
";

    #[test]
    fn builds_workload_pod() {
        let values = prepare_values(parse_values(DOC).unwrap()).unwrap();
        let spec = build_pod_spec(&values.pod_values()).unwrap();

        let secrets: Vec<_> = spec
            .image_pull_secrets
            .as_ref()
            .unwrap()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(secrets, ["other", "regcred", "shared"]);
        assert_eq!(spec.service_account_name.as_deref(), Some("foo--bar--test"));
        assert_eq!(spec.node_selector.as_ref().unwrap()["pool"], "general");
        assert_eq!(spec.containers.len(), 2);
        assert!(spec.init_containers.is_none());
    }

    #[test]
    fn volumes_are_sorted_and_resolved() {
        let values = prepare_values(parse_values(DOC).unwrap()).unwrap();
        let volumes = build_volumes(&values.pod_values()).unwrap();
        let names: Vec<_> = volumes.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            names,
            ["cache", "certs", "data", "host", "legacy", "settings", "zz-scratch"]
        );

        let cache = volumes[0].empty_dir.as_ref().unwrap();
        assert_eq!(cache.medium, None);

        let certs = volumes[1].secret.as_ref().unwrap();
        assert_eq!(certs.secret_name.as_deref(), Some("tls"));
        assert_eq!(certs.default_mode, Some(0o444));
        let items = certs.items.as_ref().unwrap();
        assert_eq!((items[0].path.as_str(), items[0].key.as_str()), ("ca", "ca.crt"));
        assert_eq!(
            (items[1].path.as_str(), items[1].key.as_str()),
            ("tls.crt", "tls.crt")
        );

        let data = volumes[2].persistent_volume_claim.as_ref().unwrap();
        assert_eq!(data.claim_name, "foo--bar--test--data");

        let host = volumes[3].host_path.as_ref().unwrap();
        assert_eq!(host.path, "/var/run");

        let legacy = volumes[4].persistent_volume_claim.as_ref().unwrap();
        assert_eq!(legacy.claim_name, "old-claim");

        let settings = volumes[5].config_map.as_ref().unwrap();
        assert_eq!(settings.name, "settings");
        assert_eq!(settings.default_mode, Some(420));

        let scratch = volumes[6].empty_dir.as_ref().unwrap();
        assert_eq!(scratch.medium.as_deref(), Some("Memory"));
    }
}
