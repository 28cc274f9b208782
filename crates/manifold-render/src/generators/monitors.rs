//! Prometheus monitors of the service and of job pods.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use manifold_core::{names, Labels};
use serde_json::{Map, Value};

use super::{object_meta, scrape_labels};
use crate::config::RenderConfig;
use crate::crds::monitoring::{NamespaceSelector, PodMonitorSpec, ServiceMonitorSpec};
use crate::crds::{PodMonitor, ServiceMonitor};
use crate::error::Result;
use crate::manifest::Manifest;
use crate::values::DeploymentValues;

pub(super) fn applies(values: &DeploymentValues) -> bool {
    values.service_monitor_enabled() || !monitored_jobs(values).is_empty()
}

pub(super) fn generate(values: &DeploymentValues, config: &RenderConfig) -> Result<Vec<Manifest>> {
    let mut out = Vec::new();

    if let Some(monitor) = values.service_monitor.as_ref().filter(|m| m.enabled) {
        let monitor = ServiceMonitor::new(
            object_meta(
                values.service_id.as_str(),
                values,
                config.common_labels(&values.metadata),
                Labels::new(),
            ),
            ServiceMonitorSpec {
                namespace_selector: namespace_selector(values),
                selector: scrape_selector(values.service_id.as_str()),
                endpoints: monitor.endpoints.clone(),
            },
        );
        out.push(Manifest::from_resource(&monitor)?);
    }

    for (name, endpoints) in monitored_jobs(values) {
        let monitor = PodMonitor::new(
            object_meta(
                name.as_str(),
                values,
                config.common_labels(&values.metadata),
                Labels::new(),
            ),
            PodMonitorSpec {
                namespace_selector: namespace_selector(values),
                selector: scrape_selector(&name),
                pod_metrics_endpoints: endpoints.to_vec(),
            },
        );
        out.push(Manifest::from_resource(&monitor)?);
    }

    Ok(out)
}

/// Job names with an enabled pod monitor, and their endpoints.
fn monitored_jobs(values: &DeploymentValues) -> Vec<(String, &[Map<String, Value>])> {
    let mut jobs = Vec::new();
    if let Some(job) = &values.pre_deployment_job {
        if let Some(monitor) = job.pod_monitor.as_ref().filter(|m| m.enabled) {
            jobs.push((
                names::pre_deploy_job_name(&values.service_id),
                monitor.endpoints.as_slice(),
            ));
        }
    }
    for cronjob in &values.cronjobs {
        if let Some(monitor) = cronjob.pod_monitor.as_ref().filter(|m| m.enabled) {
            jobs.push((
                names::cronjob_name(&cronjob.name, &values.metadata.environment),
                monitor.endpoints.as_slice(),
            ));
        }
    }
    jobs
}

fn namespace_selector(values: &DeploymentValues) -> NamespaceSelector {
    NamespaceSelector {
        match_names: vec![values.metadata.namespace.clone()],
    }
}

fn scrape_selector(name: &str) -> LabelSelector {
    LabelSelector {
        match_labels: Some(scrape_labels(name)),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::values;

    const MONITORED: &str = "
serviceMonitor:
  enabled: true
  endpoints:
    - port: main-port
      path: /metrics
preDeploymentJob:
  image: {repository: migrate, tag: '1'}
  podMonitor:
    enabled: true
    endpoints:
      - port: metrics
cronjobs:
  - name: quiet
    schedule: '* * * * *'
    image: {repository: worker, tag: '1'}
    podMonitor:
      enabled: false
      endpoints:
        - port: metrics
  - name: loud
    schedule: '* * * * *'
    image: {repository: worker, tag: '1'}
    podMonitor:
      enabled: true
      endpoints:
        - port: metrics
";

    #[test]
    fn nothing_enabled_does_not_apply() {
        assert!(!applies(&values("")));
        assert!(!applies(&values(
            "serviceMonitor:\n  enabled: false\n  endpoints:\n    - port: x\n"
        )));
        assert!(applies(&values(MONITORED)));
    }

    #[test]
    fn monitors_for_service_and_jobs() {
        let out = generate(&values(MONITORED), &RenderConfig::default()).unwrap();
        let found: Vec<_> = out
            .iter()
            .map(|m| (m.kind().unwrap(), m.name().unwrap()))
            .collect();
        assert_eq!(
            found,
            [
                ("ServiceMonitor", "foo--bar--test"),
                ("PodMonitor", "foo--bar--test--pre-deploy"),
                ("PodMonitor", "loud--test"),
            ]
        );

        let service: ServiceMonitor = out[0].decode().unwrap();
        assert_eq!(service.api_version, "monitoring.coreos.com/v1");
        assert_eq!(service.spec.namespace_selector.match_names, ["apps"]);
        let selector = service.spec.selector.match_labels.unwrap();
        assert_eq!(selector["app"], "foo--bar--test");
        assert_eq!(selector["prometheus-scrape"], "true");
        assert_eq!(service.spec.endpoints[0]["path"], "/metrics");

        let cron: PodMonitor = out[2].decode().unwrap();
        assert_eq!(cron.spec.selector.match_labels.unwrap()["app"], "loud--test");
        assert_eq!(cron.spec.pod_metrics_endpoints[0]["port"], "metrics");
    }
}
