//! The network entrypoint: an `Ingress` or an `HTTPRoute`.
//!
//! Cross-field validation guarantees at most one of them is enabled.

use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use manifold_core::Labels;
use manifold_schema::{Ingress as IngressValues, IngressVariant};
use tracing::warn;

use super::object_meta;
use crate::config::RenderConfig;
use crate::crds::HttpRoute;
use crate::error::{RenderError, Result};
use crate::manifest::Manifest;
use crate::values::DeploymentValues;

const HOMEPAGE_PREFIX: &str = "gethomepage.dev/";

pub(super) fn applies(values: &DeploymentValues) -> bool {
    enabled_ingress(values).is_some() || enabled_route(values).is_some()
}

pub(super) fn generate(values: &DeploymentValues, config: &RenderConfig) -> Result<Vec<Manifest>> {
    let mut out = Vec::new();
    if let Some(ingress) = enabled_ingress(values) {
        out.push(Manifest::from_resource(&build_ingress(values, ingress, config)?)?);
    }
    if let Some(route) = enabled_route(values) {
        let route = HttpRoute::new(
            object_meta(
                values.service_id.as_str(),
                values,
                config.with_common_labels(&route.labels, &values.metadata),
                route.annotations.clone(),
            ),
            route.spec.clone(),
        );
        out.push(Manifest::from_resource(&route)?);
    }
    Ok(out)
}

fn enabled_ingress(values: &DeploymentValues) -> Option<&IngressValues> {
    values.ingress.as_ref().filter(|i| i.enabled)
}

fn enabled_route(values: &DeploymentValues) -> Option<&manifold_schema::HttpRoute> {
    values.http_route.as_ref().filter(|r| r.enabled)
}

fn build_ingress(
    values: &DeploymentValues,
    ingress: &IngressValues,
    config: &RenderConfig,
) -> Result<Ingress> {
    let homepage = ingress
        .homepage
        .iter()
        .map(|(key, value)| (format!("{HOMEPAGE_PREFIX}{key}"), value.clone()));

    let (annotations, spec) = match &ingress.variant {
        IngressVariant::Simple { host } => {
            warn!(
                service_id = %values.service_id,
                "Simple ingress is deprecated, write the ingress spec out instead"
            );
            let mut annotations = simple_annotations(host);
            annotations.extend(homepage);
            (annotations, simple_spec(values, host)?)
        }
        IngressVariant::Full(spec) => {
            let mut annotations: Labels = homepage.collect();
            annotations.extend(ingress.annotations.clone());
            (annotations, spec.clone())
        }
    };

    Ok(Ingress {
        metadata: object_meta(
            values.service_id.as_str(),
            values,
            config.with_common_labels(&ingress.labels, &values.metadata),
            annotations,
        ),
        spec: Some(spec),
        ..Default::default()
    })
}

fn simple_annotations(host: &str) -> Labels {
    [
        ("kubernetes.io/ingress.class", "nginx"),
        ("traefik.ingress.kubernetes.io/router.entrypoints", "websecure"),
        ("traefik.ingress.kubernetes.io/router.tls", "true"),
        ("traefik.ingress.kubernetes.io/router.tls.certresolver", "static"),
        ("traefik.ingress.kubernetes.io/router.tls.domains.0.main", host),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// One rule for `host`, routing `/` to the main port of the service.
fn simple_spec(values: &DeploymentValues, host: &str) -> Result<IngressSpec> {
    let main_port = values
        .main_container()
        .and_then(|c| c.ports.first())
        .map(|p| p.port)
        .ok_or_else(|| RenderError::generator("entrypoint", "main container has no port"))?;

    Ok(IngressSpec {
        rules: Some(vec![IngressRule {
            host: Some(host.to_string()),
            http: Some(HTTPIngressRuleValue {
                paths: vec![HTTPIngressPath {
                    path: Some("/".to_string()),
                    path_type: "ImplementationSpecific".to_string(),
                    backend: IngressBackend {
                        service: Some(IngressServiceBackend {
                            name: values.service_id.to_string(),
                            port: Some(ServiceBackendPort {
                                number: Some(main_port),
                                ..Default::default()
                            }),
                        }),
                        ..Default::default()
                    },
                }],
            }),
        }]),
        ..Default::default()
    })
}
