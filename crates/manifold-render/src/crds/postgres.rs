//! Zalando postgres-operator cluster.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{impl_api_defaults, HasApiResource};

/// `postgresql` cluster resource
///
/// The spec is kept as JSON so that arbitrary operator fields can be
/// merged over the generated one.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Postgresql {
    /// API version (acid.zalan.do/v1)
    #[serde(default = "Postgresql::default_api_version")]
    pub api_version: String,
    /// Resource kind
    #[serde(default = "Postgresql::default_kind")]
    pub kind: String,
    /// Resource metadata
    pub metadata: ObjectMeta,
    /// Cluster specification
    pub spec: Value,
}

impl HasApiResource for Postgresql {
    const API_VERSION: &'static str = "acid.zalan.do/v1";
    const KIND: &'static str = "postgresql";
}

impl_api_defaults!(Postgresql);

impl Postgresql {
    /// Create a new cluster
    #[must_use]
    pub fn new(metadata: ObjectMeta, spec: Value) -> Self {
        Self {
            api_version: Self::default_api_version(),
            kind: Self::default_kind(),
            metadata,
            spec,
        }
    }
}

/// The generated part of a cluster spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostgresSpec {
    /// Owning team
    pub team_id: String,
    /// Server parameters
    pub postgresql: PostgresqlParam,
    /// Number of instances
    pub number_of_instances: i32,
    /// Data volume
    pub volume: PostgresVolume,
    /// Logical backups
    pub enable_logical_backup: bool,
    /// Users and their role flags
    pub users: BTreeMap<String, Vec<String>>,
    /// Databases and their owners
    pub databases: BTreeMap<String, String>,
    /// Instance resources
    pub resources: PostgresResources,
}

/// Server parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PostgresqlParam {
    /// Major version
    pub version: String,
}

/// Data volume
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostgresVolume {
    /// Volume size
    pub size: String,
    /// Storage class
    pub storage_class: String,
}

/// Requests and limits of each instance
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PostgresResources {
    /// Requests
    pub requests: ResourceDescription,
    /// Limits
    pub limits: ResourceDescription,
}

/// CPU and memory amounts
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResourceDescription {
    /// CPU amount
    pub cpu: String,
    /// Memory amount
    pub memory: String,
}

impl Default for PostgresResources {
    fn default() -> Self {
        Self {
            requests: ResourceDescription {
                cpu: "100m".to_string(),
                memory: "100Mi".to_string(),
            },
            limits: ResourceDescription {
                cpu: "1".to_string(),
                memory: "500Mi".to_string(),
            },
        }
    }
}

/// Merge `overlay` into `base`.
///
/// Objects merge key by key, recursively. Any other overlay value replaces
/// the base value, except `null`, which leaves the base untouched.
pub fn merge_override(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => merge_override(existing, value),
                    None if !value.is_null() => {
                        base.insert(key.clone(), value.clone());
                    }
                    None => {}
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}
