//! The main workload: a `Deployment`, or a `StatefulSet` plus its headless service.

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, StatefulSet, StatefulSetSpec};
use k8s_openapi::api::core::v1::{PodTemplateSpec, Service, ServiceSpec};
use manifold_core::{names, Labels};
use manifold_schema::WorkloadKind;

use super::{app_labels, app_selector, object_meta, template_meta};
use crate::config::RenderConfig;
use crate::error::Result;
use crate::generators::service::service_ports;
use crate::manifest::Manifest;
use crate::pod::build_pod_spec;
use crate::values::DeploymentValues;

pub(super) fn generate(values: &DeploymentValues, config: &RenderConfig) -> Result<Vec<Manifest>> {
    let template = pod_template(values, config)?;
    let replicas = values.autoscaling.is_none().then_some(values.replica_count);
    let metadata = object_meta(
        values.service_id.as_str(),
        values,
        config.with_common_labels(&values.labels, &values.metadata),
        values.annotations.clone(),
    );

    match values.kind {
        WorkloadKind::Deployment => {
            let deployment = Deployment {
                metadata,
                spec: Some(DeploymentSpec {
                    replicas,
                    selector: app_selector(values.service_id.as_str()),
                    strategy: values.strategy.clone(),
                    template,
                    ..Default::default()
                }),
                ..Default::default()
            };
            Ok(vec![Manifest::from_resource(&deployment)?])
        }
        WorkloadKind::StatefulSet => {
            let headless_name = names::headless_service_name(&values.service_id);
            let options = &values.stateful_set;
            let stateful_set = StatefulSet {
                metadata,
                spec: Some(StatefulSetSpec {
                    replicas,
                    selector: app_selector(values.service_id.as_str()),
                    service_name: headless_name.clone().into(),
                    template,
                    pod_management_policy: options.pod_management_policy.clone(),
                    update_strategy: options.update_strategy.clone(),
                    revision_history_limit: options.revision_history_limit,
                    min_ready_seconds: options.min_ready_seconds,
                    persistent_volume_claim_retention_policy: options
                        .persistent_volume_claim_retention_policy
                        .clone(),
                    volume_claim_templates: options.volume_claim_templates.clone(),
                    ordinals: options.ordinals.clone(),
                    ..Default::default()
                }),
                ..Default::default()
            };
            let headless = Service {
                metadata: object_meta(
                    headless_name,
                    values,
                    config.common_labels(&values.metadata),
                    Labels::new(),
                ),
                spec: Some(ServiceSpec {
                    selector: Some(app_labels(values.service_id.as_str())),
                    type_: Some("ClusterIP".to_string()),
                    cluster_ip: Some("None".to_string()),
                    ports: Some(service_ports(values)),
                    ..Default::default()
                }),
                ..Default::default()
            };
            Ok(vec![
                Manifest::from_resource(&stateful_set)?,
                Manifest::from_resource(&headless)?,
            ])
        }
    }
}

/// Pod template of the workload.
///
/// Each container's tag is pinned in a `container-<name>-image-tag`
/// annotation so that a tag-only change alters the template.
fn pod_template(values: &DeploymentValues, config: &RenderConfig) -> Result<PodTemplateSpec> {
    let mut annotations = values.pod_annotations.clone();
    for container in &values.containers {
        annotations.insert(
            format!("container-{}-image-tag", container.name),
            container.image.tag.clone(),
        );
    }
    Ok(PodTemplateSpec {
        metadata: Some(template_meta(
            config.with_common_labels(&values.pod_labels, &values.metadata),
            annotations,
        )),
        spec: Some(build_pod_spec(&values.pod_values())?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::values;

    #[test]
    fn deployment_pins_image_tags() {
        let values = values(
            "replicaCount: 3
podAnnotations: {team: core}
labels: {tier: web}
sidecars:
  proxy:
    image: {repository: envoy, tag: v2}
",
        );
        let out = generate(&values, &RenderConfig::default()).unwrap();
        assert_eq!(out.len(), 1);
        let deployment: Deployment = out[0].decode().unwrap();
        assert_eq!(out[0].kind(), Some("Deployment"));
        assert_eq!(deployment.metadata.name.as_deref(), Some("foo--bar--test"));
        assert_eq!(deployment.metadata.labels.as_ref().unwrap()["tier"], "web");
        assert_eq!(deployment.metadata.labels.as_ref().unwrap()["app"], "foo--bar--test");

        let spec = deployment.spec.unwrap();
        assert_eq!(spec.replicas, Some(3));
        assert_eq!(
            spec.selector.match_labels.unwrap()["app"],
            "foo--bar--test"
        );
        let annotations = spec.template.metadata.unwrap().annotations.unwrap();
        assert_eq!(annotations["team"], "core");
        assert_eq!(annotations["container-main-image-tag"], "v1");
        assert_eq!(annotations["container-proxy-image-tag"], "v2");
    }

    #[test]
    fn autoscaled_workload_has_no_replicas() {
        let values = values("autoscaling:\n  minReplicas: 2\n  maxReplicas: 4\n");
        let out = generate(&values, &RenderConfig::default()).unwrap();
        let deployment: Deployment = out[0].decode().unwrap();
        assert_eq!(deployment.spec.unwrap().replicas, None);
        assert!(out[0].get("spec").unwrap().get("replicas").is_none());
    }

    #[test]
    fn stateful_set_gets_headless_service() {
        let values = values(
            "kind: StatefulSet
statefulSet:
  podManagementPolicy: Parallel
",
        );
        let out = generate(&values, &RenderConfig::default()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind(), Some("StatefulSet"));
        assert_eq!(out[1].kind(), Some("Service"));
        assert_eq!(out[1].name(), Some("foo--bar--test-headless"));

        assert_eq!(
            out[0].get("spec").unwrap()["serviceName"],
            "foo--bar--test-headless"
        );
        let stateful_set: StatefulSet = out[0].decode().unwrap();
        let spec = stateful_set.spec.unwrap();
        assert_eq!(spec.pod_management_policy.as_deref(), Some("Parallel"));
        assert_eq!(spec.replicas, Some(1));

        let headless: Service = out[1].decode().unwrap();
        let spec = headless.spec.unwrap();
        assert_eq!(spec.cluster_ip.as_deref(), Some("None"));
        assert_eq!(spec.ports.unwrap()[0].name.as_deref(), Some("main-port"));
    }
}
