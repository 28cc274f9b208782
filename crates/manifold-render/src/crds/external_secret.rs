//! External Secrets Operator `ExternalSecret`.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use super::{impl_api_defaults, HasApiResource};

/// `ExternalSecret` resource
///
/// Fetches values from an external store and materializes them as a
/// platform secret owned by this object.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecret {
    /// API version
    #[serde(default = "ExternalSecret::default_api_version")]
    pub api_version: String,
    /// Resource kind
    #[serde(default = "ExternalSecret::default_kind")]
    pub kind: String,
    /// Resource metadata
    pub metadata: ObjectMeta,
    /// Secret specification
    pub spec: ExternalSecretSpec,
}

impl HasApiResource for ExternalSecret {
    const API_VERSION: &'static str = "external-secrets.io/v1";
    const KIND: &'static str = "ExternalSecret";
}

impl_api_defaults!(ExternalSecret);

impl ExternalSecret {
    /// Create a new external secret
    #[must_use]
    pub fn new(metadata: ObjectMeta, spec: ExternalSecretSpec) -> Self {
        Self {
            api_version: Self::default_api_version(),
            kind: Self::default_kind(),
            metadata,
            spec,
        }
    }
}

/// `ExternalSecret` spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretSpec {
    /// How often the values are re-read
    pub refresh_interval: String,
    /// Store to read from
    pub secret_store_ref: SecretStoreRef,
    /// The secret to produce
    pub target: ExternalSecretTarget,
    /// Individual keys
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<ExternalSecretData>,
    /// Bulk extraction
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_from: Vec<ExternalSecretDataFrom>,
}

/// Reference to a secret store
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SecretStoreRef {
    /// Store name
    pub name: String,
    /// Store kind
    pub kind: String,
}

/// The produced secret
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretTarget {
    /// Secret name
    pub name: String,
    /// Creation policy (Owner, Merge, ...)
    pub creation_policy: String,
    /// Deletion policy (Delete, Retain, ...)
    pub deletion_policy: String,
    /// Template shaping the secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<ExternalSecretTemplate>,
}

/// Template shaping the produced secret
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretTemplate {
    /// Secret type
    #[serde(rename = "type")]
    pub type_: String,
    /// Template engine version
    pub engine_version: String,
    /// Merge policy
    pub merge_policy: String,
    /// Templated secret data
    pub data: BTreeMap<String, String>,
}

/// One key fetched from the store
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretData {
    /// Key in the produced secret
    pub secret_key: String,
    /// Where to read it from
    pub remote_ref: RemoteRef,
}

/// Bulk extraction of a whole remote secret
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExternalSecretDataFrom {
    /// Remote secret to extract
    pub extract: RemoteRef,
}

/// Location of a value in the store
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRef {
    /// Remote secret path
    pub key: String,
    /// Property within the remote secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    /// Conversion strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_strategy: Option<String>,
    /// Decoding strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoding_strategy: Option<String>,
    /// Metadata policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_policy: Option<String>,
}

impl RemoteRef {
    /// Reference a whole remote secret.
    #[must_use]
    pub fn whole(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            property: None,
            conversion_strategy: None,
            decoding_strategy: None,
            metadata_policy: None,
        }
    }

    /// Reference one property with the default strategies.
    #[must_use]
    pub fn property(key: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            property: Some(property.into()),
            conversion_strategy: Some("Default".to_string()),
            decoding_strategy: Some("None".to_string()),
            metadata_policy: Some("None".to_string()),
        }
    }
}
