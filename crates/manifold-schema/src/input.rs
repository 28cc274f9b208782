//! The input model: a typed mirror of the configuration document.
//!
//! Field names follow the camelCase keys of the document. Platform types
//! (probes, affinity, tolerations, ...) are reused as-is; every polymorphic
//! field is resolved to a concrete variant while decoding.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use k8s_openapi::api::apps::v1::{
    DeploymentStrategy, StatefulSetOrdinals, StatefulSetPersistentVolumeClaimRetentionPolicy,
    StatefulSetUpdateStrategy,
};
use k8s_openapi::api::autoscaling::v2::{HorizontalPodAutoscalerBehavior, MetricSpec};
use k8s_openapi::api::batch::v1::PodFailurePolicy;
use k8s_openapi::api::core::v1::{
    Affinity, EnvVar, Lifecycle, PersistentVolumeClaim, Probe, ResourceRequirements, Toleration,
};
use k8s_openapi::api::policy::v1::PodDisruptionBudgetSpec;
use k8s_openapi::api::rbac::v1::PolicyRule;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use manifold_core::{Labels, ServiceMetadata};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::ingress::{HttpRoute, Ingress};
use crate::scalar::{nested_string_map, string_map};
use crate::volume::Volume;

/// Secret keys projected into environment variables.
///
/// `None` projects the whole secret; otherwise each env name maps to an
/// optional key override (the env name itself when absent).
pub type SecretMapping = Option<BTreeMap<String, Option<String>>>;

/// Volumes keyed by name.
pub type Volumes = BTreeMap<String, Volume>;

/// The whole configuration document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValues {
    /// Service identity.
    #[serde(flatten)]
    pub metadata: ServiceMetadata,
    /// The main container, declared at the top level.
    #[serde(flatten)]
    pub container: ContainerSpec,

    /// Name of the main container; `main` when absent.
    #[serde(default)]
    pub main_container_name: Option<String>,
    /// Replica count; 1 when absent.
    #[serde(default)]
    pub replica_count: Option<i32>,
    /// Horizontal autoscaler.
    #[serde(default)]
    pub autoscaling: Option<Autoscaling>,
    /// Rollout strategy of a stateless workload.
    #[serde(default)]
    pub strategy: Option<DeploymentStrategy>,
    /// Disruption budget; the selector is always derived.
    #[serde(default)]
    pub pod_disruption_budget: Option<PodDisruptionBudgetSpec>,
    /// Init containers of the workload pod.
    #[serde(default)]
    pub init_containers: Vec<InitContainerSpec>,
    /// Ingress-style entrypoint.
    #[serde(default)]
    pub ingress: Option<Ingress>,
    /// Route-style entrypoint.
    #[serde(default)]
    pub http_route: Option<HttpRoute>,
    /// Volumes of the workload pod.
    #[serde(default)]
    pub volumes: Volumes,
    /// Sidecar containers keyed by name.
    #[serde(default)]
    pub sidecars: BTreeMap<String, ContainerSpec>,
    /// Job run before each rollout.
    #[serde(default)]
    pub pre_deployment_job: Option<PreDeploymentJobSpec>,
    /// Identity annotations and extra role grants.
    #[serde(default)]
    pub service_account: Option<ServiceAccountSpec>,
    /// Managed database cluster.
    #[serde(default)]
    pub db: Option<Database>,
    /// Scheduled jobs.
    #[serde(default)]
    pub cronjobs: Vec<CronjobSpec>,
    /// Config maps keyed by name.
    #[serde(default, deserialize_with = "nested_string_map")]
    pub config_maps: BTreeMap<String, BTreeMap<String, String>>,
    /// Service monitor of the workload.
    #[serde(default)]
    pub service_monitor: Option<ServiceMonitorSpec>,

    /// Workload annotations.
    #[serde(default)]
    pub annotations: Labels,
    /// Pod template annotations.
    #[serde(default)]
    pub pod_annotations: Labels,
    /// Workload labels.
    #[serde(default)]
    pub labels: Labels,
    /// Pod template labels.
    #[serde(default)]
    pub pod_labels: Labels,

    /// Node selector applied to every pod.
    #[serde(default, deserialize_with = "string_map")]
    pub node_selector: BTreeMap<String, String>,
    /// Tolerations applied to every pod.
    #[serde(default)]
    pub tolerations: Vec<Toleration>,
    /// Affinity applied to every pod.
    #[serde(default)]
    pub affinity: Option<Affinity>,

    /// Arbitrary manifests emitted unchanged.
    #[serde(default)]
    pub extra_manifests: Vec<Map<String, JsonValue>>,

    /// Workload kind tag as written, checked by cross-field validation.
    #[serde(default)]
    pub kind: Option<String>,
    /// The workload kind resolved from `kind` by cross-field validation.
    #[serde(skip)]
    pub workload_kind: WorkloadKind,
    /// Options of a stateful workload.
    #[serde(default)]
    pub stateful_set: Option<StatefulSetOptions>,
}

/// Image of a container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    /// Image repository.
    pub repository: String,
    /// Image tag.
    #[serde(default)]
    pub tag: Option<String>,
    /// Pull policy; `IfNotPresent` when absent.
    #[serde(default)]
    pub pull_policy: Option<String>,
    /// Names of pull secrets.
    #[serde(default)]
    pub pull_secrets: Vec<String>,
    /// Reuse the main container's tag.
    #[serde(default)]
    pub inherit_main_container_tag: Option<bool>,
}

/// A container port.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSpec {
    /// Service-facing port.
    pub port: i32,
    /// Port inside the container; `port` when absent.
    #[serde(default)]
    pub container_port: Option<i32>,
    /// Whether the port is exposed on the service; true when absent.
    #[serde(default)]
    pub expose: Option<bool>,
    /// Explicit port name.
    #[serde(default)]
    pub name: Option<String>,
}

impl PortSpec {
    /// The port the container listens on.
    #[must_use]
    pub fn target_port(&self) -> i32 {
        self.container_port.unwrap_or(self.port)
    }

    /// Whether the port appears on the service.
    #[must_use]
    pub fn is_exposed(&self) -> bool {
        self.expose.unwrap_or(true)
    }
}

/// One container: image, process, ports, environment and probes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    /// Image of the container.
    pub image: ImageSpec,
    /// Arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Entrypoint override.
    #[serde(default)]
    pub command: Vec<String>,
    /// Ports.
    #[serde(default)]
    pub ports: Vec<PortSpec>,
    /// Literal environment variables.
    #[serde(default, deserialize_with = "string_map")]
    pub envs: BTreeMap<String, String>,
    /// Environment entries passed through as written.
    #[serde(default)]
    pub envs_raw: Vec<EnvVar>,
    /// Platform secrets projected into the environment, keyed by secret name.
    #[serde(default)]
    pub kube_secrets: BTreeMap<String, SecretMapping>,
    /// Secrets fetched from external stores.
    #[serde(default)]
    pub external_secrets: Vec<ExternalSecretDefinition>,
    /// Resource requests and limits.
    #[serde(default)]
    pub resources: Option<ResourceRequirements>,
    /// Readiness probe.
    #[serde(default)]
    pub readiness_probe: Option<Probe>,
    /// Liveness probe.
    #[serde(default)]
    pub liveness_probe: Option<Probe>,
    /// Lifecycle hooks.
    #[serde(default)]
    pub lifecycle: Option<Lifecycle>,
}

/// A reference to an external secret store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretStoreRef {
    /// Store name.
    pub name: String,
    /// Store kind; `ClusterSecretStore` when absent.
    #[serde(default)]
    pub kind: Option<String>,
}

/// Secrets fetched from one external store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretDefinition {
    /// The store to read from.
    pub secret_store: SecretStoreRef,
    /// Refresh interval; `1m` when absent.
    #[serde(default)]
    pub refresh_interval: Option<String>,
    /// Secret paths in the store and how each is projected.
    pub mapping: BTreeMap<String, SecretMapping>,
}

/// An init container: a container with a mandatory name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitContainerSpec {
    /// Container name.
    pub name: String,
    /// The container itself.
    #[serde(flatten)]
    pub container: ContainerSpec,
}

/// Job spec fields shared by the pre-deployment job and scheduled jobs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOptions {
    /// Active deadline in seconds.
    #[serde(default)]
    pub active_deadline_seconds: Option<i64>,
    /// Retry limit.
    #[serde(default)]
    pub backoff_limit: Option<i32>,
    /// Completion mode.
    #[serde(default)]
    pub completion_mode: Option<String>,
    /// Required completions.
    #[serde(default)]
    pub completions: Option<i32>,
    /// Parallelism.
    #[serde(default)]
    pub parallelism: Option<i32>,
    /// Pod failure policy.
    #[serde(default)]
    pub pod_failure_policy: Option<PodFailurePolicy>,
    /// Pod selector.
    #[serde(default)]
    pub selector: Option<LabelSelector>,
    /// Cleanup delay after completion.
    #[serde(default)]
    pub ttl_seconds_after_finished: Option<i32>,
}

/// The job run before each rollout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreDeploymentJobSpec {
    /// The job's main container.
    #[serde(flatten)]
    pub container: ContainerSpec,
    /// Name of the main container; `main` when absent.
    #[serde(default)]
    pub main_container_name: Option<String>,
    /// Init containers.
    #[serde(default)]
    pub init_containers: Vec<InitContainerSpec>,
    /// Volumes of the job pod.
    #[serde(default)]
    pub volumes: Volumes,
    /// Job annotations.
    #[serde(default)]
    pub annotations: Labels,
    /// Pod annotations.
    #[serde(default)]
    pub pod_annotations: Labels,
    /// Job labels.
    #[serde(default)]
    pub labels: Labels,
    /// Pod labels.
    #[serde(default)]
    pub pod_labels: Labels,
    /// Pod monitor of the job.
    #[serde(default)]
    pub pod_monitor: Option<PodMonitorSpec>,
    /// Create the job suspended.
    #[serde(default)]
    pub suspend: Option<bool>,
    /// Job spec overrides.
    #[serde(flatten)]
    pub job: JobOptions,
}

/// A scheduled job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronjobSpec {
    /// The job's main container.
    #[serde(flatten)]
    pub container: ContainerSpec,
    /// Job name.
    pub name: String,
    /// Cron schedule.
    pub schedule: String,
    /// Name of the main container; `main` when absent.
    #[serde(default)]
    pub main_container_name: Option<String>,
    /// Init containers.
    #[serde(default)]
    pub init_containers: Vec<InitContainerSpec>,
    /// Volumes of the job pod.
    #[serde(default)]
    pub volumes: Volumes,
    /// Pod monitor of the job.
    #[serde(default)]
    pub pod_monitor: Option<PodMonitorSpec>,

    /// Scheduled job annotations.
    #[serde(default)]
    pub cron_job_annotations: Labels,
    /// Scheduled job labels.
    #[serde(default)]
    pub cron_job_labels: Labels,
    /// Job template annotations.
    #[serde(default)]
    pub job_annotations: Labels,
    /// Job template labels.
    #[serde(default)]
    pub job_labels: Labels,
    /// Pod annotations.
    #[serde(default)]
    pub pod_annotations: Labels,
    /// Pod labels.
    #[serde(default)]
    pub pod_labels: Labels,

    /// Suspend scheduling.
    #[serde(default)]
    pub suspend: Option<bool>,
    /// Time zone of the schedule.
    #[serde(default)]
    pub time_zone: Option<String>,
    /// Concurrency policy; `Allow` when absent.
    #[serde(default)]
    pub concurrency_policy: Option<String>,
    /// Deadline for starting a missed run.
    #[serde(default)]
    pub starting_deadline_seconds: Option<i64>,
    /// Successful runs to keep.
    #[serde(default)]
    pub successful_jobs_history_limit: Option<i32>,
    /// Failed runs to keep.
    #[serde(default)]
    pub failed_jobs_history_limit: Option<i32>,
    /// Job spec overrides.
    #[serde(flatten)]
    pub job: JobOptions,
}

/// Identity annotations and extra role grants.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountSpec {
    /// Identity annotations.
    #[serde(default)]
    pub annotations: Labels,
    /// Namespaced role granted to the identity.
    #[serde(default)]
    pub additional_role: Option<RoleGrant>,
    /// Cluster role granted to the identity.
    #[serde(default)]
    pub additional_cluster_role: Option<RoleGrant>,
}

/// A role and its binding to the service identity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleGrant {
    /// Name of both the role and its binding.
    #[serde(default)]
    pub name: Option<String>,
    /// Rules of the role.
    pub rules: Vec<PolicyRule>,
}

/// A managed database cluster.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    /// Whether the cluster is rendered.
    pub enabled: bool,
    /// Cluster object name.
    pub cluster_name: String,
    /// Number of instances.
    pub replicas: i32,
    /// Major version.
    pub version: u32,
    /// Storage size.
    pub size: String,
    /// Storage class.
    pub storage_class: String,
    /// Enable logical backups.
    #[serde(default)]
    pub backup: Option<bool>,
    /// Users and their role flags.
    pub users: BTreeMap<String, Vec<String>>,
    /// Databases and their owners.
    pub databases: BTreeMap<String, String>,
    /// Cluster spec fields merged over the generated spec.
    #[serde(default)]
    pub additional_config: Option<Map<String, JsonValue>>,
}

/// Horizontal autoscaler bounds and policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Autoscaling {
    /// Lower bound.
    #[serde(default)]
    pub min_replicas: Option<i32>,
    /// Upper bound.
    pub max_replicas: i32,
    /// Scaling metrics.
    #[serde(default)]
    pub metrics: Option<Vec<MetricSpec>>,
    /// Scaling behavior.
    #[serde(default)]
    pub behavior: Option<HorizontalPodAutoscalerBehavior>,
}

/// Service monitor declaration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMonitorSpec {
    /// Whether the monitor is rendered.
    pub enabled: bool,
    /// Scrape endpoints, passed through.
    pub endpoints: Vec<Map<String, JsonValue>>,
}

/// Pod monitor declaration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodMonitorSpec {
    /// Whether the monitor is rendered.
    pub enabled: bool,
    /// Pod metrics endpoints, passed through.
    pub endpoints: Vec<Map<String, JsonValue>>,
}

/// Options of a stateful workload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatefulSetOptions {
    /// Pod management policy.
    #[serde(default)]
    pub pod_management_policy: Option<String>,
    /// Update strategy.
    #[serde(default)]
    pub update_strategy: Option<StatefulSetUpdateStrategy>,
    /// Revisions to keep.
    #[serde(default)]
    pub revision_history_limit: Option<i32>,
    /// Minimum ready seconds.
    #[serde(default)]
    pub min_ready_seconds: Option<i32>,
    /// Claim retention policy.
    #[serde(default)]
    pub persistent_volume_claim_retention_policy:
        Option<StatefulSetPersistentVolumeClaimRetentionPolicy>,
    /// Per-replica claim templates.
    #[serde(default)]
    pub volume_claim_templates: Option<Vec<PersistentVolumeClaim>>,
    /// Replica ordinals.
    #[serde(default)]
    pub ordinals: Option<StatefulSetOrdinals>,
}

/// The two workload kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    /// Stateless replicated workload.
    #[default]
    Deployment,
    /// Stable-identity replicated workload.
    StatefulSet,
}

impl WorkloadKind {
    /// The kind as written in documents and object envelopes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deployment => "Deployment",
            Self::StatefulSet => "StatefulSet",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkloadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Deployment" => Ok(Self::Deployment),
            "StatefulSet" => Ok(Self::StatefulSet),
            other => Err(format!("invalid kind {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults() {
        let port: PortSpec = serde_yaml::from_str("port: 8080\n").unwrap();
        assert_eq!(port.target_port(), 8080);
        assert!(port.is_exposed());

        let port: PortSpec =
            serde_yaml::from_str("port: 80\ncontainerPort: 8080\nexpose: false\n").unwrap();
        assert_eq!(port.target_port(), 8080);
        assert!(!port.is_exposed());
    }

    #[test]
    fn secret_mapping_null_means_whole_secret() {
        let c: ContainerSpec = serde_yaml::from_str(
            "image:\n  repository: r\nkubeSecrets:\n  whole:\n  partial:\n    DB_PASS: password\n    DB_USER:\n",
        )
        .unwrap();
        assert_eq!(c.kube_secrets["whole"], None);
        let partial = c.kube_secrets["partial"].as_ref().unwrap();
        assert_eq!(partial["DB_PASS"].as_deref(), Some("password"));
        assert_eq!(partial["DB_USER"], None);
    }

    #[test]
    fn init_container_flattens_container_fields() {
        let c: InitContainerSpec = serde_yaml::from_str(
            "name: migrate\nimage:\n  repository: r\n  inheritMainContainerTag: true\nargs: [up]\n",
        )
        .unwrap();
        assert_eq!(c.name, "migrate");
        assert_eq!(c.container.args, vec!["up".to_string()]);
        assert_eq!(c.container.image.inherit_main_container_tag, Some(true));
    }

    #[test]
    fn cronjob_suspend_is_schedule_level() {
        let c: CronjobSpec = serde_yaml::from_str(
            "name: nightly\nschedule: '0 0 * * *'\nimage:\n  repository: r\nsuspend: true\nbackoffLimit: 2\n",
        )
        .unwrap();
        assert_eq!(c.suspend, Some(true));
        assert_eq!(c.job.backoff_limit, Some(2));
    }

    #[test]
    fn workload_kind_parsing() {
        assert_eq!("StatefulSet".parse(), Ok(WorkloadKind::StatefulSet));
        assert_eq!("Deployment".parse(), Ok(WorkloadKind::Deployment));
        assert_eq!(
            "DaemonSet".parse::<WorkloadKind>(),
            Err("invalid kind DaemonSet".to_string())
        );
        assert_eq!(WorkloadKind::default(), WorkloadKind::Deployment);
    }
}
