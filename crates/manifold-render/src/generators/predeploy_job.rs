//! The job run before each install or upgrade.

use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use manifold_core::names;
use manifold_schema::JobOptions;

use super::{object_meta, scrape_labels, template_meta};
use crate::config::RenderConfig;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::pod::build_pod_spec;
use crate::values::{pod_monitor_enabled, DeploymentValues};

/// Hook annotations that order the job before the rollout.
const HOOK_ANNOTATIONS: [(&str, &str); 2] = [
    ("helm.sh/hook", "pre-install, pre-upgrade"),
    ("helm.sh/hook-weight", "-5"),
];

pub(super) fn applies(values: &DeploymentValues) -> bool {
    values.pre_deployment_job.is_some()
}

pub(super) fn generate(values: &DeploymentValues, config: &RenderConfig) -> Result<Vec<Manifest>> {
    let Some(job) = &values.pre_deployment_job else {
        return Ok(Vec::new());
    };
    let name = names::pre_deploy_job_name(&values.service_id);

    let mut annotations: manifold_core::Labels = HOOK_ANNOTATIONS
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    annotations.extend(job.annotations.clone());

    let mut pod_labels = job.pod_labels.clone();
    if pod_monitor_enabled(job.pod_monitor.as_ref()) {
        pod_labels.extend(scrape_labels(&name));
    }

    let mut pod_spec = build_pod_spec(&values.job_pod_values(job))?;
    pod_spec.restart_policy = Some("Never".to_string());

    let resource = Job {
        metadata: object_meta(
            name,
            values,
            config.with_common_labels(&job.labels, &values.metadata),
            annotations,
        ),
        spec: Some(job_spec(
            &job.job,
            job.suspend,
            PodTemplateSpec {
                metadata: Some(template_meta(pod_labels, job.pod_annotations.clone())),
                spec: Some(pod_spec),
            },
        )),
        ..Default::default()
    };
    Ok(vec![Manifest::from_resource(&resource)?])
}

/// A job spec from the shared job options.
pub(super) fn job_spec(
    options: &JobOptions,
    suspend: Option<bool>,
    template: PodTemplateSpec,
) -> JobSpec {
    JobSpec {
        template,
        suspend,
        active_deadline_seconds: options.active_deadline_seconds,
        backoff_limit: options.backoff_limit,
        completion_mode: options.completion_mode.clone(),
        completions: options.completions,
        parallelism: options.parallelism,
        pod_failure_policy: options.pod_failure_policy.clone(),
        selector: options.selector.clone(),
        ttl_seconds_after_finished: options.ttl_seconds_after_finished,
        ..Default::default()
    }
}
