//! The generic object envelope emitted by the pipeline.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RenderError, Result};

/// One output object: `apiVersion`, `kind`, `metadata` and the rest.
///
/// A `status` field never survives construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(Map<String, Value>);

impl Manifest {
    /// Convert a typed object into a manifest.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Serialization`] if the object does not
    /// serialize, and [`RenderError::Generator`] if it is not a JSON object.
    pub fn from_resource<T: Serialize>(resource: &T) -> Result<Self> {
        match serde_json::to_value(resource)? {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(RenderError::generator(
                "manifest",
                format!("expected an object, got {other}"),
            )),
        }
    }

    /// Wrap a JSON object, dropping its `status`.
    #[must_use]
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        map.remove("status");
        Self(map)
    }

    /// The `apiVersion` field.
    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.0.get("apiVersion").and_then(Value::as_str)
    }

    /// The `kind` field.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.0.get("kind").and_then(Value::as_str)
    }

    /// The `metadata.name` field.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.metadata_str("name")
    }

    /// The `metadata.namespace` field.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.metadata_str("namespace")
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.0
            .get("metadata")
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
    }

    /// Look up a top-level field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Decode the manifest into a typed object.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Serialization`] if the shapes do not match.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.0.clone()))?)
    }

    /// Borrow the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Take the underlying JSON object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}
