//! The pipeline driver.
//!
//! Runs every applicable generator in order against one canonical model and
//! concatenates their output. The first failure aborts the run; no partial
//! output is ever returned.

use manifold_schema::InputValues;
use tracing::{debug, info};

use crate::config::RenderConfig;
use crate::error::Result;
use crate::generators::GENERATORS;
use crate::manifest::Manifest;
use crate::prepare::prepare_values;
use crate::values::DeploymentValues;

/// Render the canonical model into the ordered list of objects.
///
/// # Errors
///
/// Returns the first generator error.
pub fn render(values: &DeploymentValues, config: &RenderConfig) -> Result<Vec<Manifest>> {
    let mut manifests = Vec::new();
    for generator in GENERATORS {
        if !(generator.applies)(values) {
            debug!(generator = generator.name, "Generator skipped");
            continue;
        }
        let produced = (generator.generate)(values, config)?;
        debug!(
            generator = generator.name,
            count = produced.len(),
            "Generator produced objects"
        );
        manifests.extend(produced);
    }

    info!(
        service_id = %values.service_id,
        count = manifests.len(),
        "Rendered resources"
    );
    Ok(manifests)
}

/// Canonicalize a validated input model and render it.
///
/// # Errors
///
/// Returns the canonicalization error or the first generator error.
pub fn compile(input: InputValues, config: &RenderConfig) -> Result<Vec<Manifest>> {
    let values = prepare_values(input)?;
    render(&values, config)
}

/// Serialize manifests as a JSON array.
///
/// # Errors
///
/// Returns [`crate::RenderError::Serialization`] if serialization fails.
pub fn to_json(manifests: &[Manifest], pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(manifests)?
    } else {
        serde_json::to_string(manifests)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::generators::test_support::BASE;
    use manifold_schema::parse_values;

    fn compile_doc(extra: &str) -> Result<Vec<Manifest>> {
        let input = parse_values(&format!("{BASE}{extra}")).unwrap();
        compile(input, &RenderConfig::with_version("1.2.3"))
    }

    fn kinds(manifests: &[Manifest]) -> Vec<&str> {
        manifests.iter().map(|m| m.kind().unwrap()).collect()
    }

    #[test]
    fn minimal_document() {
        let out = compile_doc("").unwrap();
        assert_eq!(kinds(&out), ["Deployment", "Service", "ServiceAccount"]);
        for manifest in &out {
            assert_eq!(
                manifest.get("metadata").unwrap()["labels"]["manifold-version"],
                "1.2.3"
            );
        }
    }

    #[test]
    fn output_follows_generator_order() {
        let out = compile_doc(
            "
ingress:
  enabled: true
  rules: [{host: foo.example.com}]
autoscaling: {maxReplicas: 3}
podDisruptionBudget: {minAvailable: 1}
configMaps:
  settings: {a: b}
cronjobs:
  - name: nightly
    schedule: '0 0 * * *'
    image: {repository: worker, tag: '1'}
extraManifests:
  - apiVersion: v1
    kind: Namespace
    metadata: {name: extra}
serviceMonitor:
  enabled: true
  endpoints: [{port: main-port}]
",
        )
        .unwrap();
        assert_eq!(
            kinds(&out),
            [
                "Deployment",
                "Service",
                "Ingress",
                "ServiceAccount",
                "CronJob",
                "HorizontalPodAutoscaler",
                "PodDisruptionBudget",
                "ConfigMap",
                "Namespace",
                "ServiceMonitor",
            ]
        );
    }

    #[test]
    fn generator_errors_abort() {
        let err = compile_doc("autoscaling: {minReplicas: 5, maxReplicas: 3}\n").unwrap_err();
        assert!(matches!(err, RenderError::ReplicaRange { .. }));
    }

    #[test]
    fn output_is_deterministic() {
        let doc = "
sidecars:
  b: {image: {repository: b, tag: '1'}}
  a: {image: {repository: a, tag: '1'}}
envs: {Z: z, A: a}
configMaps: {y: {k: v}, x: {k: v}}
";
        let first = to_json(&compile_doc(doc).unwrap(), false).unwrap();
        let second = to_json(&compile_doc(doc).unwrap(), false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn json_is_an_array() {
        let out = compile_doc("").unwrap();
        let json = to_json(&out, true).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 3);
    }
}
