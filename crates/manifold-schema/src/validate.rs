//! Structural and cross-field validation of the input model.
//!
//! Structural checks cover what typed decoding cannot express: non-blank
//! required strings, non-empty collections, numeric ranges and quantity
//! syntax. Cross-field rules then look at the model as a whole. Both stop at
//! the first failure.

use kube::core::TypeMeta;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::input::{ContainerSpec, InputValues, RoleGrant, WorkloadKind};
use crate::quantity::parse_size;

/// A rule spanning several fields of the input model.
pub type CrossFieldRule = fn(&InputValues) -> std::result::Result<(), String>;

/// Cross-field rules, evaluated in order after the workload kind resolves.
pub const CROSS_FIELD_RULES: &[(&str, CrossFieldRule)] = &[(
    "exclusive-entrypoints",
    entrypoints_are_exclusive as CrossFieldRule,
)];

/// Resolve the workload kind, then run every cross-field rule, stopping at
/// the first failure.
///
/// # Errors
///
/// Returns [`SchemaError::CrossField`] for an unknown workload kind or with
/// the message of the failing rule.
pub fn validate_cross_field(values: &InputValues) -> Result<WorkloadKind> {
    let kind = match values.kind.as_deref() {
        Some(kind) => kind.parse().map_err(SchemaError::CrossField)?,
        None => WorkloadKind::default(),
    };
    for (name, rule) in CROSS_FIELD_RULES {
        debug!(rule = name, "checking cross-field rule");
        rule(values).map_err(SchemaError::CrossField)?;
    }
    Ok(kind)
}

fn entrypoints_are_exclusive(values: &InputValues) -> std::result::Result<(), String> {
    let ingress = values.ingress.as_ref().is_some_and(|i| i.enabled);
    let route = values.http_route.as_ref().is_some_and(|r| r.enabled);
    if ingress && route {
        return Err("`ingress` and `httpRoute` cannot be enabled at the same time".to_string());
    }
    Ok(())
}

/// Check the structural constraints typed decoding cannot express.
///
/// # Errors
///
/// Returns [`SchemaError::Validation`] naming the first offending field.
pub fn validate_structure(values: &InputValues) -> Result<()> {
    values.metadata.validate()?;

    if let Some(replicas) = values.replica_count {
        if replicas < 0 {
            return Err(SchemaError::validation("replicaCount", "must not be negative"));
        }
    }

    check_container("", &values.container)?;
    for (name, sidecar) in &values.sidecars {
        check_container(&format!("sidecars.{name}."), sidecar)?;
    }
    for (i, init) in values.init_containers.iter().enumerate() {
        let path = format!("initContainers[{i}].");
        require(&path, "name", &init.name)?;
        check_container(&path, &init.container)?;
    }

    if let Some(job) = &values.pre_deployment_job {
        check_container("preDeploymentJob.", &job.container)?;
        for (i, init) in job.init_containers.iter().enumerate() {
            let path = format!("preDeploymentJob.initContainers[{i}].");
            require(&path, "name", &init.name)?;
            check_container(&path, &init.container)?;
        }
        if let Some(monitor) = &job.pod_monitor {
            require_non_empty("preDeploymentJob.podMonitor.endpoints", monitor.endpoints.len())?;
        }
    }

    for (i, cronjob) in values.cronjobs.iter().enumerate() {
        let path = format!("cronjobs[{i}].");
        require(&path, "name", &cronjob.name)?;
        require(&path, "schedule", &cronjob.schedule)?;
        check_container(&path, &cronjob.container)?;
        for (j, init) in cronjob.init_containers.iter().enumerate() {
            let init_path = format!("{path}initContainers[{j}].");
            require(&init_path, "name", &init.name)?;
            check_container(&init_path, &init.container)?;
        }
        if let Some(monitor) = &cronjob.pod_monitor {
            require_non_empty(&format!("{path}podMonitor.endpoints"), monitor.endpoints.len())?;
        }
    }

    if let Some(monitor) = &values.service_monitor {
        require_non_empty("serviceMonitor.endpoints", monitor.endpoints.len())?;
    }

    if let Some(autoscaling) = &values.autoscaling {
        if autoscaling.max_replicas < 1 {
            return Err(SchemaError::validation(
                "autoscaling.maxReplicas",
                "must be at least 1",
            ));
        }
    }

    if let Some(sa) = &values.service_account {
        check_role("serviceAccount.additionalRole", sa.additional_role.as_ref())?;
        check_role(
            "serviceAccount.additionalClusterRole",
            sa.additional_cluster_role.as_ref(),
        )?;
    }

    if let Some(db) = &values.db {
        require("db.", "clusterName", &db.cluster_name)?;
        require("db.", "storageClass", &db.storage_class)?;
        parse_size(&db.size).map_err(|e| SchemaError::validation("db.size", e.to_string()))?;
        if db.replicas < 1 {
            return Err(SchemaError::validation("db.replicas", "must be at least 1"));
        }
    }

    for (i, manifest) in values.extra_manifests.iter().enumerate() {
        let field = format!("extraManifests[{i}]");
        let meta: TypeMeta = serde_json::from_value(JsonValue::Object(manifest.clone()))
            .map_err(|e| SchemaError::validation(&field, e.to_string()))?;
        if meta.api_version.is_empty() || meta.kind.is_empty() {
            return Err(SchemaError::validation(
                field,
                "`apiVersion` and `kind` must not be empty",
            ));
        }
    }

    Ok(())
}

fn check_container(path: &str, container: &ContainerSpec) -> Result<()> {
    require(path, "image.repository", &container.image.repository)?;

    for (i, port) in container.ports.iter().enumerate() {
        let field = format!("{path}ports[{i}]");
        check_port(&format!("{field}.port"), port.port)?;
        if let Some(container_port) = port.container_port {
            check_port(&format!("{field}.containerPort"), container_port)?;
        }
    }

    for (i, secrets) in container.external_secrets.iter().enumerate() {
        let field = format!("{path}externalSecrets[{i}]");
        require(&format!("{field}."), "secretStore.name", &secrets.secret_store.name)?;
        require_non_empty(&format!("{field}.mapping"), secrets.mapping.len())?;
    }
    Ok(())
}

fn check_role(path: &str, role: Option<&RoleGrant>) -> Result<()> {
    match role {
        Some(role) => require_non_empty(&format!("{path}.rules"), role.rules.len()),
        None => Ok(()),
    }
}

fn check_port(field: &str, port: i32) -> Result<()> {
    if (1..=65535).contains(&port) {
        Ok(())
    } else {
        Err(SchemaError::validation(field, format!("{port} is not a valid port")))
    }
}

fn require(path: &str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SchemaError::validation(
            format!("{path}{field}"),
            "must not be empty",
        ));
    }
    Ok(())
}

fn require_non_empty(field: &str, len: usize) -> Result<()> {
    if len == 0 {
        return Err(SchemaError::validation(field, "must contain at least one entry"));
    }
    Ok(())
}
