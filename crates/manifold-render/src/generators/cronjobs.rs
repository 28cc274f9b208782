//! One `CronJob` per scheduled job.

use k8s_openapi::api::batch::v1::{CronJob, CronJobSpec, JobTemplateSpec};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use manifold_core::names;

use super::predeploy_job::job_spec;
use super::{object_meta, scrape_labels, template_meta};
use crate::config::RenderConfig;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::pod::build_pod_spec;
use crate::values::{pod_monitor_enabled, Cronjob, DeploymentValues};

const DEFAULT_CONCURRENCY_POLICY: &str = "Allow";

pub(super) fn applies(values: &DeploymentValues) -> bool {
    !values.cronjobs.is_empty()
}

pub(super) fn generate(values: &DeploymentValues, config: &RenderConfig) -> Result<Vec<Manifest>> {
    values
        .cronjobs
        .iter()
        .map(|cronjob| Manifest::from_resource(&build_cronjob(values, cronjob, config)?))
        .collect()
}

fn build_cronjob(
    values: &DeploymentValues,
    cronjob: &Cronjob,
    config: &RenderConfig,
) -> Result<CronJob> {
    let name = names::cronjob_name(&cronjob.name, &values.metadata.environment);

    let mut pod_labels = cronjob.pod_labels.clone();
    if pod_monitor_enabled(cronjob.pod_monitor.as_ref()) {
        pod_labels.extend(scrape_labels(&name));
    }

    let mut pod_spec = build_pod_spec(&values.cronjob_pod_values(cronjob))?;
    pod_spec.restart_policy = Some("OnFailure".to_string());

    let job_template = JobTemplateSpec {
        metadata: Some(template_meta(
            config.with_common_labels(&cronjob.job_labels, &values.metadata),
            cronjob.job_annotations.clone(),
        )),
        spec: Some(job_spec(
            &cronjob.job,
            None,
            PodTemplateSpec {
                metadata: Some(template_meta(pod_labels, cronjob.pod_annotations.clone())),
                spec: Some(pod_spec),
            },
        )),
    };

    Ok(CronJob {
        metadata: object_meta(
            name,
            values,
            config.with_common_labels(&cronjob.cron_job_labels, &values.metadata),
            cronjob.cron_job_annotations.clone(),
        ),
        spec: Some(CronJobSpec {
            schedule: cronjob.schedule.clone(),
            job_template,
            concurrency_policy: Some(
                cronjob
                    .concurrency_policy
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CONCURRENCY_POLICY.to_string()),
            ),
            suspend: cronjob.suspend,
            time_zone: cronjob.time_zone.clone(),
            starting_deadline_seconds: cronjob.starting_deadline_seconds,
            successful_jobs_history_limit: cronjob.successful_jobs_history_limit,
            failed_jobs_history_limit: cronjob.failed_jobs_history_limit,
        }),
        ..Default::default()
    })
}
