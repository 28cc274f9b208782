//! Canonicalization of the validated input model.
//!
//! Every container host (workload, pre-deployment job, each cronjob) is
//! walked by the same routine: names are resolved, and every non-main
//! container gets its image tag checked against the inheritance rule.

use manifold_schema::{
    ContainerSpec, CronjobSpec, ImageSpec, InitContainerSpec, InputValues, PreDeploymentJobSpec,
};
use tracing::debug;

use crate::error::{RenderError, Result};
use crate::values::{
    Container, Cronjob, DeploymentValues, Image, PreDeploymentJob, DEFAULT_PULL_POLICY,
};

/// Name of a main container without an override.
pub const DEFAULT_CONTAINER_NAME: &str = "main";

const MISSING_SIDE_TAG: &str =
    "side container must have either `image.tag` set or `image.inheritMainContainerTag: true`";

/// Build the canonical model from a validated input model.
///
/// # Errors
///
/// Returns [`RenderError::Canonicalize`] naming the container host when the
/// main container has no tag or port, or a non-main container can neither
/// use its own tag nor inherit the main one.
pub fn prepare_values(input: InputValues) -> Result<DeploymentValues> {
    let service_id = input.metadata.service_id();
    let main_tag = main_container_tag(&input)?;

    let mut containers = vec![convert_container(
        &input.container,
        &main_tag,
        first_name(&[input.main_container_name.as_deref(), Some(DEFAULT_CONTAINER_NAME)]),
    )];
    for (name, sidecar) in &input.sidecars {
        let tag = resolve_tag(&sidecar.image, &main_tag, || format!("sidecar '{name}'"))?;
        containers.push(convert_container(sidecar, &tag, name.trim().to_string()));
    }
    let init_containers = convert_init_containers(&input.init_containers, &main_tag, |name| {
        format!("init container '{name}'")
    })?;
    debug!(
        service_id = %service_id,
        containers = containers.len(),
        init_containers = init_containers.len(),
        "Canonicalized workload containers"
    );

    let pre_deployment_job = input
        .pre_deployment_job
        .map(|job| prepare_job(job, &main_tag))
        .transpose()?;

    let cronjobs = input
        .cronjobs
        .into_iter()
        .map(|cronjob| prepare_cronjob(cronjob, &main_tag))
        .collect::<Result<Vec<_>>>()?;

    Ok(DeploymentValues {
        metadata: input.metadata,
        service_id,
        kind: input.workload_kind,
        replica_count: input.replica_count.unwrap_or(1),
        containers,
        init_containers,
        volumes: input.volumes,
        autoscaling: input.autoscaling,
        strategy: input.strategy,
        pod_disruption_budget: input.pod_disruption_budget,
        ingress: input.ingress,
        http_route: input.http_route,
        pre_deployment_job,
        service_account: input.service_account.unwrap_or_default(),
        db: input.db,
        cronjobs,
        config_maps: input.config_maps,
        service_monitor: input.service_monitor,
        annotations: input.annotations,
        pod_annotations: input.pod_annotations,
        labels: input.labels,
        pod_labels: input.pod_labels,
        node_selector: input.node_selector,
        tolerations: input.tolerations,
        affinity: input.affinity,
        extra_manifests: input.extra_manifests,
        stateful_set: input.stateful_set.unwrap_or_default(),
    })
}

fn main_container_tag(input: &InputValues) -> Result<String> {
    let tag = input
        .container
        .image
        .tag
        .as_deref()
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .ok_or_else(|| RenderError::canonicalize("main container", "must have `image.tag` set"))?;
    if input.container.ports.is_empty() {
        return Err(RenderError::canonicalize(
            "main container",
            "must have at least one port",
        ));
    }
    Ok(tag.to_string())
}

/// Resolve the tag of a non-main container.
///
/// An explicit, non-blank tag wins. Otherwise the main tag is used when the
/// container opts into inheritance.
fn resolve_tag(image: &ImageSpec, main_tag: &str, host: impl FnOnce() -> String) -> Result<String> {
    if let Some(tag) = image.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(tag.to_string());
    }
    if image.inherit_main_container_tag == Some(true) {
        return Ok(main_tag.to_string());
    }
    Err(RenderError::canonicalize(host(), MISSING_SIDE_TAG))
}

fn convert_init_containers(
    specs: &[InitContainerSpec],
    main_tag: &str,
    host: impl Fn(&str) -> String,
) -> Result<Vec<Container>> {
    specs
        .iter()
        .map(|init| {
            let tag = resolve_tag(&init.container.image, main_tag, || host(&init.name))?;
            Ok(convert_container(
                &init.container,
                &tag,
                init.name.trim().to_string(),
            ))
        })
        .collect()
}

fn prepare_job(job: PreDeploymentJobSpec, main_tag: &str) -> Result<PreDeploymentJob> {
    let tag = resolve_tag(&job.container.image, main_tag, || {
        "pre-deployment job main container".to_string()
    })?;
    let container = convert_container(
        &job.container,
        &tag,
        first_name(&[job.main_container_name.as_deref(), Some(DEFAULT_CONTAINER_NAME)]),
    );
    let init_containers = convert_init_containers(&job.init_containers, main_tag, |name| {
        format!("pre-deployment job's init container '{name}'")
    })?;
    debug!(init_containers = init_containers.len(), "Canonicalized pre-deployment job");

    Ok(PreDeploymentJob {
        container,
        init_containers,
        volumes: job.volumes,
        annotations: job.annotations,
        pod_annotations: job.pod_annotations,
        labels: job.labels,
        pod_labels: job.pod_labels,
        pod_monitor: job.pod_monitor,
        suspend: job.suspend,
        job: job.job,
    })
}

fn prepare_cronjob(cronjob: CronjobSpec, main_tag: &str) -> Result<Cronjob> {
    let name = cronjob.name.clone();
    let tag = resolve_tag(&cronjob.container.image, main_tag, || {
        format!("cronjob '{name}' main container")
    })?;
    let container = convert_container(
        &cronjob.container,
        &tag,
        first_name(&[
            cronjob.main_container_name.as_deref(),
            Some(DEFAULT_CONTAINER_NAME),
        ]),
    );
    let init_containers = convert_init_containers(&cronjob.init_containers, main_tag, |init| {
        format!("cronjob '{name}' init container '{init}'")
    })?;
    debug!(cronjob = %name, init_containers = init_containers.len(), "Canonicalized cronjob");

    Ok(Cronjob {
        name: cronjob.name,
        schedule: cronjob.schedule,
        container,
        init_containers,
        volumes: cronjob.volumes,
        pod_monitor: cronjob.pod_monitor,
        cron_job_annotations: cronjob.cron_job_annotations,
        cron_job_labels: cronjob.cron_job_labels,
        job_annotations: cronjob.job_annotations,
        job_labels: cronjob.job_labels,
        pod_annotations: cronjob.pod_annotations,
        pod_labels: cronjob.pod_labels,
        suspend: cronjob.suspend,
        time_zone: cronjob.time_zone,
        concurrency_policy: cronjob.concurrency_policy,
        starting_deadline_seconds: cronjob.starting_deadline_seconds,
        successful_jobs_history_limit: cronjob.successful_jobs_history_limit,
        failed_jobs_history_limit: cronjob.failed_jobs_history_limit,
        job: cronjob.job,
    })
}

/// The first candidate that is present and not blank, trimmed.
fn first_name(candidates: &[Option<&str>]) -> String {
    candidates
        .iter()
        .flatten()
        .map(|name| name.trim())
        .find(|name| !name.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn convert_container(spec: &ContainerSpec, tag: &str, name: String) -> Container {
    Container {
        name,
        image: Image {
            repository: spec.image.repository.clone(),
            tag: tag.to_string(),
            pull_policy: spec
                .image
                .pull_policy
                .clone()
                .unwrap_or_else(|| DEFAULT_PULL_POLICY.to_string()),
            pull_secrets: spec.image.pull_secrets.clone(),
        },
        args: spec.args.clone(),
        command: spec.command.clone(),
        ports: spec.ports.clone(),
        envs: spec.envs.clone(),
        envs_raw: spec.envs_raw.clone(),
        kube_secrets: spec.kube_secrets.clone(),
        external_secrets: spec.external_secrets.clone(),
        resources: spec.resources.clone(),
        readiness_probe: spec.readiness_probe.clone(),
        liveness_probe: spec.liveness_probe.clone(),
        lifecycle: spec.lifecycle.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifold_schema::{parse_values, WorkloadKind};

    const BASE: &str = "
namespace: apps
service: foo
component: bar
environment: test
image:
  repository: registry/foo
  tag: v1
ports:
  - port: 8080
";

    fn prepare(extra: &str) -> Result<DeploymentValues> {
        prepare_values(parse_values(&format!("{BASE}{extra}")).unwrap())
    }

    #[test]
    fn defaults() {
        let values = prepare("").unwrap();
        assert_eq!(values.service_id.as_str(), "foo--bar--test");
        assert_eq!(values.replica_count, 1);
        assert_eq!(values.kind, WorkloadKind::Deployment);
        assert_eq!(values.containers.len(), 1);

        let main = &values.containers[0];
        assert_eq!(main.name, "main");
        assert_eq!(main.image.reference(), "registry/foo:v1");
        assert_eq!(main.image.pull_policy, "IfNotPresent");
    }

    #[test]
    fn main_container_name_override() {
        let values = prepare("mainContainerName: ' api '\n").unwrap();
        assert_eq!(values.containers[0].name, "api");

        let values = prepare("mainContainerName: '  '\n").unwrap();
        assert_eq!(values.containers[0].name, "main");
    }

    #[test]
    fn sidecar_inherits_main_tag() {
        let values = prepare(
            "sidecars:\n  proxy:\n    image:\n      repository: envoy\n      inheritMainContainerTag: true\n",
        )
        .unwrap();
        assert_eq!(values.containers[1].name, "proxy");
        assert_eq!(values.containers[1].image.tag, "v1");
    }

    #[test]
    fn explicit_tag_wins_over_inheritance() {
        let values = prepare(
            "sidecars:\n  proxy:\n    image:\n      repository: envoy\n      tag: v9\n      inheritMainContainerTag: true\n",
        )
        .unwrap();
        assert_eq!(values.containers[1].image.tag, "v9");
    }

    #[test]
    fn sidecars_follow_main_in_name_order() {
        let values = prepare(
            "sidecars:\n  zeta:\n    image: {repository: z, tag: '1'}\n  alpha:\n    image: {repository: a, tag: '1'}\n",
        )
        .unwrap();
        let names: Vec<_> = values.containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["main", "alpha", "zeta"]);
    }

    #[test]
    fn sidecar_without_tag_fails() {
        let err = prepare("sidecars:\n  proxy:\n    image:\n      repository: envoy\n")
            .unwrap_err()
            .to_string();
        assert!(err.contains("sidecar 'proxy'"), "{err}");
        assert!(err.contains("inheritMainContainerTag"), "{err}");

        let err = prepare(
            "sidecars:\n  proxy:\n    image:\n      repository: envoy\n      inheritMainContainerTag: false\n",
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::Canonicalize { .. }));
    }

    #[test]
    fn main_container_requires_tag() {
        let input = "
namespace: apps
service: foo
component: bar
environment: test
image:
  repository: registry/foo
ports:
  - port: 8080
";
        let err = prepare_values(parse_values(input).unwrap()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "error validating main container: must have `image.tag` set"
        );
    }

    #[test]
    fn init_container_errors_name_the_container() {
        let err = prepare("initContainers:\n  - name: migrate\n    image: {repository: m}\n")
            .unwrap_err()
            .to_string();
        assert!(err.contains("init container 'migrate'"), "{err}");
    }

    #[test]
    fn job_hosts_are_canonicalized() {
        let values = prepare(
            "preDeploymentJob:
  image: {repository: job, inheritMainContainerTag: true}
  initContainers:
    - name: wait
      image: {repository: busybox, tag: '1.36'}
cronjobs:
  - name: nightly
    schedule: '0 0 * * *'
    mainContainerName: worker
    image: {repository: cron, inheritMainContainerTag: true}
",
        )
        .unwrap();
        let job = values.pre_deployment_job.as_ref().unwrap();
        assert_eq!(job.container.name, "main");
        assert_eq!(job.container.image.tag, "v1");
        assert_eq!(job.init_containers[0].image.tag, "1.36");

        let cronjob = &values.cronjobs[0];
        assert_eq!(cronjob.container.name, "worker");
        assert_eq!(cronjob.container.image.tag, "v1");
        assert_eq!(values.all_containers().len(), 4);
    }

    #[test]
    fn cronjob_errors_name_the_cronjob() {
        let err = prepare(
            "cronjobs:\n  - name: nightly\n    schedule: '0 0 * * *'\n    image: {repository: cron}\n",
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("cronjob 'nightly' main container"), "{err}");

        let err = prepare(
            "cronjobs:
  - name: nightly
    schedule: '0 0 * * *'
    image: {repository: cron, tag: '1'}
    initContainers:
      - name: wait
        image: {repository: busybox}
",
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("cronjob 'nightly' init container 'wait'"), "{err}");
    }

    #[test]
    fn stateful_kind_is_parsed() {
        let values = prepare("kind: StatefulSet\nreplicaCount: 3\n").unwrap();
        assert_eq!(values.kind, WorkloadKind::StatefulSet);
        assert_eq!(values.replica_count, 3);
    }

    #[test]
    fn kind_is_taken_from_validated_input() {
        let mut input = parse_values(&format!("{BASE}kind: StatefulSet\n")).unwrap();
        assert_eq!(input.workload_kind, WorkloadKind::StatefulSet);
        input.kind = Some("DaemonSet".to_string());
        let values = prepare_values(input).unwrap();
        assert_eq!(values.kind, WorkloadKind::StatefulSet);
    }
}
