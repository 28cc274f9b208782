//! Container assembly: environment, ports and volume mounts.

use k8s_openapi::api::core::v1::{
    Container as K8sContainer, ContainerPort, EnvFromSource, EnvVar, EnvVarSource,
    SecretEnvSource, SecretKeySelector, VolumeMount as K8sVolumeMount,
};
use manifold_core::{names, ServiceId};
use manifold_schema::Volumes;

use crate::values::{Container, PodValues};

/// Mount propagation of read-write mounts.
const HOST_TO_CONTAINER: &str = "HostToContainer";

/// Build the platform container for one canonical container.
#[must_use]
pub fn build_container(container: &Container, pod: &PodValues<'_>) -> K8sContainer {
    let (env, env_from) = build_env(container, pod.service_id);
    K8sContainer {
        name: container.name.clone(),
        image: Some(container.image.reference()),
        image_pull_policy: Some(container.image.pull_policy.clone()),
        args: non_empty(container.args.clone()),
        command: non_empty(container.command.clone()),
        env: non_empty(env),
        env_from: non_empty(env_from),
        ports: non_empty(build_ports(container)),
        resources: container.resources.clone(),
        lifecycle: container.lifecycle.clone(),
        readiness_probe: container.readiness_probe.clone(),
        liveness_probe: container.liveness_probe.clone(),
        volume_mounts: non_empty(build_volume_mounts(container, pod.volumes)),
        ..Default::default()
    }
}

/// Environment entries and sources, in a fixed order.
///
/// Entries: literal values sorted by name, then single keys of platform
/// secrets, then the raw entries as written. Sources: whole platform secrets,
/// then one per external secret path.
#[must_use]
pub fn build_env(container: &Container, service_id: &ServiceId) -> (Vec<EnvVar>, Vec<EnvFromSource>) {
    let mut env: Vec<EnvVar> = container
        .envs
        .iter()
        .map(|(name, value)| EnvVar {
            name: name.clone(),
            value: Some(value.clone()),
            ..Default::default()
        })
        .collect();
    let mut env_from = Vec::new();

    for (secret, mapping) in &container.kube_secrets {
        match mapping {
            None => env_from.push(secret_env_source(secret.clone())),
            Some(keys) => env.extend(keys.iter().map(|(env_name, key)| EnvVar {
                name: env_name.clone(),
                value_from: Some(EnvVarSource {
                    secret_key_ref: Some(SecretKeySelector {
                        name: secret.clone(),
                        key: key.clone().unwrap_or_else(|| env_name.clone()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            })),
        }
    }

    for definition in &container.external_secrets {
        for path in definition.mapping.keys() {
            env_from.push(secret_env_source(names::external_secret_name(
                service_id,
                &definition.secret_store.name,
                path,
            )));
        }
    }

    env.extend(container.envs_raw.iter().cloned());
    (env, env_from)
}

fn secret_env_source(name: String) -> EnvFromSource {
    EnvFromSource {
        secret_ref: Some(SecretEnvSource {
            name,
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Container ports: the container-side port, named when a name is given.
#[must_use]
pub fn build_ports(container: &Container) -> Vec<ContainerPort> {
    container
        .ports
        .iter()
        .map(|port| ContainerPort {
            container_port: port.target_port(),
            name: port.name.clone(),
            ..Default::default()
        })
        .collect()
}

/// Mounts of every pod volume that declares a mount for this container.
///
/// Secret and config map projections are read-only. Everything else is
/// read-write with host-to-container propagation and an optional sub path.
#[must_use]
pub fn build_volume_mounts(container: &Container, volumes: &Volumes) -> Vec<K8sVolumeMount> {
    volumes
        .iter()
        .filter_map(|(name, volume)| {
            let mount = volume.mounts.get(&container.name)?;
            let read_only = volume.volume_type().is_read_only();
            Some(K8sVolumeMount {
                name: name.clone(),
                mount_path: mount.container_path.clone(),
                read_only: Some(read_only),
                mount_propagation: (!read_only).then(|| HOST_TO_CONTAINER.to_string()),
                sub_path: if read_only {
                    None
                } else {
                    mount.volume_path.clone()
                },
                ..Default::default()
            })
        })
        .collect()
}

/// `None` for an empty list, so that empty arrays are left out of the output.
pub(crate) fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
