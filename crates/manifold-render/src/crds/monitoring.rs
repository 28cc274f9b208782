//! Prometheus operator monitors.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{impl_api_defaults, HasApiResource};

/// Namespaces a monitor looks into.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSelector {
    /// Namespace names
    pub match_names: Vec<String>,
}

/// `ServiceMonitor` resource
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMonitor {
    /// API version (monitoring.coreos.com/v1)
    #[serde(default = "ServiceMonitor::default_api_version")]
    pub api_version: String,
    /// Resource kind
    #[serde(default = "ServiceMonitor::default_kind")]
    pub kind: String,
    /// Resource metadata
    pub metadata: ObjectMeta,
    /// Monitor specification
    pub spec: ServiceMonitorSpec,
}

/// `ServiceMonitor` spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMonitorSpec {
    /// Namespaces to look into
    pub namespace_selector: NamespaceSelector,
    /// Services to scrape
    pub selector: LabelSelector,
    /// Scrape endpoints
    pub endpoints: Vec<Map<String, Value>>,
}

impl HasApiResource for ServiceMonitor {
    const API_VERSION: &'static str = "monitoring.coreos.com/v1";
    const KIND: &'static str = "ServiceMonitor";
}

impl_api_defaults!(ServiceMonitor);

impl ServiceMonitor {
    /// Create a new service monitor
    #[must_use]
    pub fn new(metadata: ObjectMeta, spec: ServiceMonitorSpec) -> Self {
        Self {
            api_version: Self::default_api_version(),
            kind: Self::default_kind(),
            metadata,
            spec,
        }
    }
}

/// `PodMonitor` resource
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodMonitor {
    /// API version (monitoring.coreos.com/v1)
    #[serde(default = "PodMonitor::default_api_version")]
    pub api_version: String,
    /// Resource kind
    #[serde(default = "PodMonitor::default_kind")]
    pub kind: String,
    /// Resource metadata
    pub metadata: ObjectMeta,
    /// Monitor specification
    pub spec: PodMonitorSpec,
}

/// `PodMonitor` spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodMonitorSpec {
    /// Namespaces to look into
    pub namespace_selector: NamespaceSelector,
    /// Pods to scrape
    pub selector: LabelSelector,
    /// Pod metrics endpoints
    pub pod_metrics_endpoints: Vec<Map<String, Value>>,
}

impl HasApiResource for PodMonitor {
    const API_VERSION: &'static str = "monitoring.coreos.com/v1";
    const KIND: &'static str = "PodMonitor";
}

impl_api_defaults!(PodMonitor);

impl PodMonitor {
    /// Create a new pod monitor
    #[must_use]
    pub fn new(metadata: ObjectMeta, spec: PodMonitorSpec) -> Self {
        Self {
            api_version: Self::default_api_version(),
            kind: Self::default_kind(),
            metadata,
            spec,
        }
    }
}
