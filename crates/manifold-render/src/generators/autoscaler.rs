//! Horizontal autoscaler targeting the workload.

use k8s_openapi::api::autoscaling::v2::{
    CrossVersionObjectReference, HorizontalPodAutoscaler, HorizontalPodAutoscalerSpec,
};
use manifold_core::Labels;

use super::object_meta;
use crate::config::RenderConfig;
use crate::error::{RenderError, Result};
use crate::manifest::Manifest;
use crate::values::DeploymentValues;

pub(super) fn applies(values: &DeploymentValues) -> bool {
    values.autoscaling.is_some()
}

pub(super) fn generate(values: &DeploymentValues, config: &RenderConfig) -> Result<Vec<Manifest>> {
    let Some(autoscaling) = &values.autoscaling else {
        return Ok(Vec::new());
    };
    if let Some(min) = autoscaling.min_replicas {
        if min > autoscaling.max_replicas {
            return Err(RenderError::ReplicaRange {
                min,
                max: autoscaling.max_replicas,
            });
        }
    }

    let hpa = HorizontalPodAutoscaler {
        metadata: object_meta(
            values.service_id.as_str(),
            values,
            config.common_labels(&values.metadata),
            Labels::new(),
        ),
        spec: Some(HorizontalPodAutoscalerSpec {
            scale_target_ref: CrossVersionObjectReference {
                api_version: Some("apps/v1".to_string()),
                kind: values.kind.as_str().to_string(),
                name: values.service_id.to_string(),
            },
            min_replicas: autoscaling.min_replicas,
            max_replicas: autoscaling.max_replicas,
            metrics: autoscaling.metrics.clone(),
            behavior: autoscaling.behavior.clone(),
        }),
        ..Default::default()
    };
    Ok(vec![Manifest::from_resource(&hpa)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::values;

    #[test]
    fn bounds_are_kept() {
        let values = values(
            "autoscaling:
  minReplicas: 2
  maxReplicas: 3
  metrics:
    - type: Resource
      resource:
        name: cpu
        target: {type: Utilization, averageUtilization: 80}
",
        );
        let out = generate(&values, &RenderConfig::default()).unwrap();
        let hpa: HorizontalPodAutoscaler = out[0].decode().unwrap();
        let spec = hpa.spec.unwrap();
        assert_eq!(spec.min_replicas, Some(2));
        assert_eq!(spec.max_replicas, 3);
        assert_eq!(spec.scale_target_ref.kind, "Deployment");
        assert_eq!(spec.scale_target_ref.name, "foo--bar--test");
        assert_eq!(spec.metrics.unwrap()[0].type_, "Resource");
    }

    #[test]
    fn targets_stateful_workloads() {
        let values = values("kind: StatefulSet\nautoscaling:\n  maxReplicas: 5\n");
        let out = generate(&values, &RenderConfig::default()).unwrap();
        let hpa: HorizontalPodAutoscaler = out[0].decode().unwrap();
        assert_eq!(hpa.spec.unwrap().scale_target_ref.kind, "StatefulSet");
    }

    #[test]
    fn inverted_bounds_fail() {
        let values = values("autoscaling:\n  minReplicas: 5\n  maxReplicas: 3\n");
        let err = generate(&values, &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, RenderError::ReplicaRange { min: 5, max: 3 }));
    }
}
