//! The canonical model handed to every generator.
//!
//! [`DeploymentValues`] is built once by [`crate::prepare::prepare_values`]
//! and never mutated afterwards. Every container in it carries a resolved
//! image tag and a non-empty name.

use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::api::apps::v1::DeploymentStrategy;
use k8s_openapi::api::core::v1::{
    Affinity, EnvVar, Lifecycle, Probe, ResourceRequirements, Toleration,
};
use k8s_openapi::api::policy::v1::PodDisruptionBudgetSpec;
use manifold_core::{Labels, ServiceId, ServiceMetadata};
use manifold_schema::{
    Autoscaling, Database, ExternalSecretDefinition, HttpRoute, Ingress, JobOptions,
    PodMonitorSpec, PortSpec, SecretMapping, ServiceAccountSpec, ServiceMonitorSpec,
    StatefulSetOptions, Volumes, WorkloadKind,
};
use serde_json::{Map, Value};

/// Pull policy used when a container does not set one.
pub const DEFAULT_PULL_POLICY: &str = "IfNotPresent";

/// A resolved container image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Image repository.
    pub repository: String,
    /// Resolved tag, explicit or inherited from the main container.
    pub tag: String,
    /// Pull policy.
    pub pull_policy: String,
    /// Names of pull secrets.
    pub pull_secrets: Vec<String>,
}

impl Image {
    /// The `repository:tag` reference.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }
}

/// A canonical container.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    /// Container name.
    pub name: String,
    /// Resolved image.
    pub image: Image,
    /// Arguments.
    pub args: Vec<String>,
    /// Entrypoint override.
    pub command: Vec<String>,
    /// Ports.
    pub ports: Vec<PortSpec>,
    /// Literal environment variables.
    pub envs: BTreeMap<String, String>,
    /// Environment entries passed through as written.
    pub envs_raw: Vec<EnvVar>,
    /// Platform secrets projected into the environment.
    pub kube_secrets: BTreeMap<String, SecretMapping>,
    /// Secrets fetched from external stores.
    pub external_secrets: Vec<ExternalSecretDefinition>,
    /// Resource requests and limits.
    pub resources: Option<ResourceRequirements>,
    /// Readiness probe.
    pub readiness_probe: Option<Probe>,
    /// Liveness probe.
    pub liveness_probe: Option<Probe>,
    /// Lifecycle hooks.
    pub lifecycle: Option<Lifecycle>,
}

/// The canonical pre-deployment job.
#[derive(Debug, Clone, PartialEq)]
pub struct PreDeploymentJob {
    /// The job's only regular container.
    pub container: Container,
    /// Init containers.
    pub init_containers: Vec<Container>,
    /// Volumes of the job pod.
    pub volumes: Volumes,
    /// Job annotations.
    pub annotations: Labels,
    /// Pod annotations.
    pub pod_annotations: Labels,
    /// Job labels.
    pub labels: Labels,
    /// Pod labels.
    pub pod_labels: Labels,
    /// Pod monitor of the job.
    pub pod_monitor: Option<PodMonitorSpec>,
    /// Create the job suspended.
    pub suspend: Option<bool>,
    /// Job spec overrides.
    pub job: JobOptions,
}

/// A canonical scheduled job.
#[derive(Debug, Clone, PartialEq)]
pub struct Cronjob {
    /// Job name, before the environment suffix.
    pub name: String,
    /// Cron schedule.
    pub schedule: String,
    /// The job's only regular container.
    pub container: Container,
    /// Init containers.
    pub init_containers: Vec<Container>,
    /// Volumes of the job pod.
    pub volumes: Volumes,
    /// Pod monitor of the job.
    pub pod_monitor: Option<PodMonitorSpec>,
    /// Scheduled job annotations.
    pub cron_job_annotations: Labels,
    /// Scheduled job labels.
    pub cron_job_labels: Labels,
    /// Job template annotations.
    pub job_annotations: Labels,
    /// Job template labels.
    pub job_labels: Labels,
    /// Pod annotations.
    pub pod_annotations: Labels,
    /// Pod labels.
    pub pod_labels: Labels,
    /// Suspend scheduling.
    pub suspend: Option<bool>,
    /// Time zone of the schedule.
    pub time_zone: Option<String>,
    /// Concurrency policy override.
    pub concurrency_policy: Option<String>,
    /// Deadline for starting a missed run.
    pub starting_deadline_seconds: Option<i64>,
    /// Successful runs to keep.
    pub successful_jobs_history_limit: Option<i32>,
    /// Failed runs to keep.
    pub failed_jobs_history_limit: Option<i32>,
    /// Job spec overrides.
    pub job: JobOptions,
}

/// The canonical model of one configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentValues {
    /// Service identity.
    pub metadata: ServiceMetadata,
    /// Derived service identifier.
    pub service_id: ServiceId,
    /// Workload kind.
    pub kind: WorkloadKind,
    /// Replica count, defaulted to 1.
    pub replica_count: i32,
    /// Main container first, then sidecars sorted by name.
    pub containers: Vec<Container>,
    /// Init containers of the workload pod.
    pub init_containers: Vec<Container>,
    /// Volumes of the workload pod.
    pub volumes: Volumes,
    /// Horizontal autoscaler.
    pub autoscaling: Option<Autoscaling>,
    /// Rollout strategy.
    pub strategy: Option<DeploymentStrategy>,
    /// Disruption budget.
    pub pod_disruption_budget: Option<PodDisruptionBudgetSpec>,
    /// Ingress-style entrypoint.
    pub ingress: Option<Ingress>,
    /// Route-style entrypoint.
    pub http_route: Option<HttpRoute>,
    /// Pre-deployment job.
    pub pre_deployment_job: Option<PreDeploymentJob>,
    /// Identity annotations and role grants.
    pub service_account: ServiceAccountSpec,
    /// Managed database cluster.
    pub db: Option<Database>,
    /// Scheduled jobs, in declaration order.
    pub cronjobs: Vec<Cronjob>,
    /// Config maps keyed by name.
    pub config_maps: BTreeMap<String, BTreeMap<String, String>>,
    /// Service monitor.
    pub service_monitor: Option<ServiceMonitorSpec>,
    /// Workload annotations.
    pub annotations: Labels,
    /// Pod template annotations.
    pub pod_annotations: Labels,
    /// Workload labels.
    pub labels: Labels,
    /// Pod template labels.
    pub pod_labels: Labels,
    /// Node selector applied to every pod.
    pub node_selector: BTreeMap<String, String>,
    /// Tolerations applied to every pod.
    pub tolerations: Vec<Toleration>,
    /// Affinity applied to every pod.
    pub affinity: Option<Affinity>,
    /// Arbitrary manifests emitted unchanged.
    pub extra_manifests: Vec<Map<String, Value>>,
    /// Options of a stateful workload.
    pub stateful_set: StatefulSetOptions,
}

/// Everything the pod builder needs, borrowed from one container host.
#[derive(Debug, Clone, Copy)]
pub struct PodValues<'a> {
    /// Service identifier, used as the service account name.
    pub service_id: &'a ServiceId,
    /// Regular containers.
    pub containers: &'a [Container],
    /// Init containers.
    pub init_containers: &'a [Container],
    /// Pod volumes.
    pub volumes: &'a Volumes,
    /// Node selector.
    pub node_selector: &'a BTreeMap<String, String>,
    /// Tolerations.
    pub tolerations: &'a [Toleration],
    /// Affinity.
    pub affinity: Option<&'a Affinity>,
}

impl PodValues<'_> {
    /// Pull secret names across all containers, sorted and deduplicated.
    #[must_use]
    pub fn pull_secrets(&self) -> BTreeSet<&str> {
        self.containers
            .iter()
            .chain(self.init_containers)
            .flat_map(|c| c.image.pull_secrets.iter().map(String::as_str))
            .collect()
    }
}

impl DeploymentValues {
    /// The main container.
    ///
    /// Canonicalization guarantees there is one, so this only returns `None`
    /// for hand-built values.
    #[must_use]
    pub fn main_container(&self) -> Option<&Container> {
        self.containers.first()
    }

    /// Pod values of the workload.
    #[must_use]
    pub fn pod_values(&self) -> PodValues<'_> {
        self.pod_values_for(&self.containers, &self.init_containers, &self.volumes)
    }

    /// Pod values of the pre-deployment job.
    #[must_use]
    pub fn job_pod_values<'a>(&'a self, job: &'a PreDeploymentJob) -> PodValues<'a> {
        self.pod_values_for(
            std::slice::from_ref(&job.container),
            &job.init_containers,
            &job.volumes,
        )
    }

    /// Pod values of a scheduled job.
    #[must_use]
    pub fn cronjob_pod_values<'a>(&'a self, cronjob: &'a Cronjob) -> PodValues<'a> {
        self.pod_values_for(
            std::slice::from_ref(&cronjob.container),
            &cronjob.init_containers,
            &cronjob.volumes,
        )
    }

    fn pod_values_for<'a>(
        &'a self,
        containers: &'a [Container],
        init_containers: &'a [Container],
        volumes: &'a Volumes,
    ) -> PodValues<'a> {
        PodValues {
            service_id: &self.service_id,
            containers,
            init_containers,
            volumes,
            node_selector: &self.node_selector,
            tolerations: &self.tolerations,
            affinity: self.affinity.as_ref(),
        }
    }

    /// Every container of every host: workload, init, job and cronjobs.
    #[must_use]
    pub fn all_containers(&self) -> Vec<&Container> {
        let mut all: Vec<&Container> = self
            .containers
            .iter()
            .chain(&self.init_containers)
            .collect();
        if let Some(job) = &self.pre_deployment_job {
            all.push(&job.container);
            all.extend(&job.init_containers);
        }
        for cronjob in &self.cronjobs {
            all.push(&cronjob.container);
            all.extend(&cronjob.init_containers);
        }
        all
    }

    /// Every volume map: workload, pre-deployment job, then each cronjob.
    #[must_use]
    pub fn all_volumes(&self) -> Vec<&Volumes> {
        let mut all = vec![&self.volumes];
        if let Some(job) = &self.pre_deployment_job {
            all.push(&job.volumes);
        }
        all.extend(self.cronjobs.iter().map(|c| &c.volumes));
        all
    }

    /// Whether the service monitor is declared and enabled.
    #[must_use]
    pub fn service_monitor_enabled(&self) -> bool {
        self.service_monitor.as_ref().is_some_and(|m| m.enabled)
    }
}

/// Whether a pod monitor is declared and enabled.
#[must_use]
pub fn pod_monitor_enabled(monitor: Option<&PodMonitorSpec>) -> bool {
    monitor.is_some_and(|m| m.enabled)
}
