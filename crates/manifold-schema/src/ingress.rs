//! Network entrypoint declarations.
//!
//! An ingress is either the legacy *simple* form, a host name from which a
//! whole spec is derived, or the *full* form that carries an inline spec.
//! The `simple` flag selects the variant and defaults to the full form.

use k8s_openapi::api::networking::v1::IngressSpec;
use manifold_core::Labels;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};
use serde_yaml::Value;

/// An ingress-style entrypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingress {
    /// Whether the entrypoint is rendered at all.
    pub enabled: bool,
    /// Extra object annotations.
    pub annotations: Labels,
    /// Extra object labels.
    pub labels: Labels,
    /// Dashboard metadata, rendered as `gethomepage.dev/<key>` annotations.
    pub homepage: Labels,
    /// The resolved variant.
    pub variant: IngressVariant,
}

/// The concrete form of an ingress.
#[derive(Debug, Clone, PartialEq)]
pub enum IngressVariant {
    /// `simple: true`, a single host routed to the main port.
    Simple {
        /// Host name of the only rule.
        host: String,
    },
    /// `simple: false` or absent, the spec is written out in full.
    Full(IngressSpec),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IngressHeader {
    enabled: bool,
    #[serde(default)]
    simple: bool,
    #[serde(default)]
    annotations: Labels,
    #[serde(default)]
    labels: Labels,
    #[serde(default)]
    homepage: Labels,
}

#[derive(Deserialize)]
struct SimpleIngress {
    host: String,
}

impl<'de> Deserialize<'de> for Ingress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let header: IngressHeader = serde_yaml::from_value(raw.clone()).map_err(D::Error::custom)?;

        let variant = if header.simple {
            let simple: SimpleIngress = serde_yaml::from_value(raw)
                .map_err(|e| D::Error::custom(format!("simple ingress: {e}")))?;
            IngressVariant::Simple { host: simple.host }
        } else {
            let spec: IngressSpec = serde_yaml::from_value(raw)
                .map_err(|e| D::Error::custom(format!("ingress spec: {e}")))?;
            IngressVariant::Full(spec)
        };

        Ok(Self {
            enabled: header.enabled,
            annotations: header.annotations,
            labels: header.labels,
            homepage: header.homepage,
            variant,
        })
    }
}

/// A route-style entrypoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRoute {
    /// Whether the entrypoint is rendered at all.
    pub enabled: bool,
    /// Extra object annotations.
    #[serde(default)]
    pub annotations: Labels,
    /// Extra object labels.
    #[serde(default)]
    pub labels: Labels,
    /// The route spec, passed through as written.
    #[serde(flatten)]
    pub spec: Map<String, JsonValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_full_spec() {
        let ingress: Ingress = serde_yaml::from_str(
            "enabled: true\nannotations:\n  a: b\nrules:\n  - host: example.com\n",
        )
        .unwrap();
        assert!(ingress.enabled);
        assert_eq!(ingress.annotations["a"], "b");
        let IngressVariant::Full(spec) = ingress.variant else {
            panic!("expected full ingress");
        };
        let rules = spec.rules.unwrap();
        assert_eq!(rules[0].host.as_deref(), Some("example.com"));
    }

    #[test]
    fn simple_requires_host() {
        let ingress: Ingress =
            serde_yaml::from_str("enabled: true\nsimple: true\nhost: example.com\n").unwrap();
        assert_eq!(
            ingress.variant,
            IngressVariant::Simple {
                host: "example.com".into()
            }
        );
        assert!(serde_yaml::from_str::<Ingress>("enabled: true\nsimple: true\n").is_err());
    }

    #[test]
    fn enabled_is_required() {
        assert!(serde_yaml::from_str::<Ingress>("rules: []\n").is_err());
        assert!(serde_yaml::from_str::<HttpRoute>("hostnames: [a]\n").is_err());
    }

    #[test]
    fn http_route_keeps_spec_fields() {
        let route: HttpRoute = serde_yaml::from_str(
            "enabled: true\nlabels:\n  team: web\nhostnames: [example.com]\nparentRefs:\n  - name: gw\n",
        )
        .unwrap();
        assert_eq!(route.labels["team"], "web");
        assert!(!route.spec.contains_key("enabled"));
        assert!(!route.spec.contains_key("labels"));
        assert_eq!(route.spec["hostnames"][0], "example.com");
        assert_eq!(route.spec["parentRefs"][0]["name"], "gw");
    }
}
