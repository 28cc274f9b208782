//! The network service in front of the workload.

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use manifold_core::Labels;

use super::{app_labels, object_meta, SCRAPE_LABEL};
use crate::config::RenderConfig;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::values::DeploymentValues;

/// Name of the first port of the main container.
pub const MAIN_PORT_NAME: &str = "main-port";

pub(super) fn generate(values: &DeploymentValues, config: &RenderConfig) -> Result<Vec<Manifest>> {
    let mut labels = config.common_labels(&values.metadata);
    if values.service_monitor_enabled() {
        labels.insert(SCRAPE_LABEL.to_string(), "true".to_string());
    }

    let service = Service {
        metadata: object_meta(values.service_id.as_str(), values, labels, Labels::new()),
        spec: Some(ServiceSpec {
            selector: Some(app_labels(values.service_id.as_str())),
            type_: Some("ClusterIP".to_string()),
            ports: Some(service_ports(values)),
            ..Default::default()
        }),
        ..Default::default()
    };
    Ok(vec![Manifest::from_resource(&service)?])
}

/// Service ports of every exposed container port.
///
/// The first port of the first container is the main port; the others are
/// named after their container and index unless they carry a name.
pub(crate) fn service_ports(values: &DeploymentValues) -> Vec<ServicePort> {
    let mut ports = Vec::new();
    for (i, container) in values.containers.iter().enumerate() {
        for (j, port) in container.ports.iter().enumerate() {
            if !port.is_exposed() {
                continue;
            }
            let name = port.name.clone().unwrap_or_else(|| {
                if i == 0 && j == 0 {
                    MAIN_PORT_NAME.to_string()
                } else {
                    format!("other-port-{}-{j}", container.name)
                }
            });
            ports.push(ServicePort {
                name: Some(name),
                port: port.port,
                target_port: Some(IntOrString::Int(port.target_port())),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            });
        }
    }
    ports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::values;

    #[test]
    fn ports_are_named_and_filtered() {
        let values = values(
            "sidecars:
  proxy:
    image: {repository: envoy, tag: v2}
    ports:
      - port: 9000
      - port: 9001
        expose: false
      - port: 9002
        containerPort: 19002
        name: admin
",
        );
        let ports = service_ports(&values);
        let names: Vec<_> = ports.iter().map(|p| p.name.as_deref().unwrap()).collect();
        assert_eq!(names, ["main-port", "other-port-proxy-0", "admin"]);
        assert_eq!(ports[2].port, 9002);
        assert_eq!(ports[2].target_port, Some(IntOrString::Int(19002)));
        assert_eq!(ports[0].protocol.as_deref(), Some("TCP"));
    }

    #[test]
    fn service_selects_the_workload() {
        let out = generate(&values(""), &RenderConfig::default()).unwrap();
        let service: Service = out[0].decode().unwrap();
        assert_eq!(service.metadata.name.as_deref(), Some("foo--bar--test"));
        assert!(!service.metadata.labels.as_ref().unwrap().contains_key(SCRAPE_LABEL));
        let spec = service.spec.unwrap();
        assert_eq!(spec.type_.as_deref(), Some("ClusterIP"));
        assert_eq!(spec.selector.unwrap()["app"], "foo--bar--test");
    }

    #[test]
    fn monitored_service_is_a_scrape_target() {
        let values = values(
            "serviceMonitor:\n  enabled: true\n  endpoints:\n    - port: main-port\n",
        );
        let out = generate(&values, &RenderConfig::default()).unwrap();
        assert_eq!(out[0].get("metadata").unwrap()["labels"][SCRAPE_LABEL], "true");
    }
}
