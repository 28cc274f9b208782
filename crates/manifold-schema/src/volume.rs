//! Volume declarations and their variant resolution.
//!
//! A volume is a tagged union keyed by its `type` field. The tag is read
//! first, then the payload of the matching variant is decoded from the same
//! node; an unknown tag is rejected during decoding so that nothing
//! downstream ever sees an unresolved volume.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};
use serde_yaml::Value;
use thiserror::Error;

use crate::quantity::{parse_size, QuantityError};

/// The discriminator values of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeType {
    /// Memory-backed scratch space.
    Tmpfs,
    /// Node-disk scratch space.
    Local,
    /// A platform volume source passed through as written.
    Raw,
    /// A persistent claim, existing or newly provisioned.
    Persistent,
    /// A projected secret.
    Secret,
    /// A projected config map.
    ConfigMap,
}

impl VolumeType {
    /// The tag as written in documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tmpfs => "tmpfs",
            Self::Local => "local",
            Self::Raw => "raw",
            Self::Persistent => "persistent",
            Self::Secret => "secret",
            Self::ConfigMap => "configMap",
        }
    }

    /// Secret and config map projections are mounted read-only.
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::Secret | Self::ConfigMap)
    }
}

impl fmt::Display for VolumeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VolumeType {
    type Err = VariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tmpfs" => Ok(Self::Tmpfs),
            "local" => Ok(Self::Local),
            "raw" => Ok(Self::Raw),
            "persistent" => Ok(Self::Persistent),
            "secret" => Ok(Self::Secret),
            "configMap" => Ok(Self::ConfigMap),
            other => Err(VariantError::UnknownVariant {
                field: "type",
                value: other.to_string(),
            }),
        }
    }
}

/// Errors raised while resolving a variant payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariantError {
    /// The discriminator holds an unknown value.
    #[error("unknown variant `{value}` for field `{field}`")]
    UnknownVariant {
        /// The discriminator field.
        field: &'static str,
        /// The offending tag value.
        value: String,
    },

    /// A field the selected variant needs is absent.
    #[error("{variant} volume missing '{field}' field")]
    MissingField {
        /// The selected variant.
        variant: &'static str,
        /// The missing field.
        field: &'static str,
    },

    /// The size of a new claim is not a quantity.
    #[error("invalid volume size: {0}")]
    InvalidSize(#[from] QuantityError),
}

/// Where a volume is mounted inside one container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    /// Mount path inside the container.
    pub container_path: String,
    /// Sub path within the volume, for read-write volumes.
    #[serde(default)]
    pub volume_path: Option<String>,
}

/// A declared volume: per-container mounts plus the resolved variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// Mounts keyed by container name.
    pub mounts: BTreeMap<String, VolumeMount>,
    /// The resolved variant payload.
    pub source: VolumeSource,
}

impl Volume {
    /// The discriminator of the resolved variant.
    #[must_use]
    pub const fn volume_type(&self) -> VolumeType {
        self.source.volume_type()
    }

    /// The new-claim payload, if this volume provisions a claim.
    #[must_use]
    pub const fn new_claim(&self) -> Option<&NewClaim> {
        match &self.source {
            VolumeSource::Persistent(PersistentVolume::New(claim)) => Some(claim),
            _ => None,
        }
    }
}

/// The concrete variant of a volume.
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeSource {
    /// `type: tmpfs`
    Tmpfs,
    /// `type: local`
    Local,
    /// `type: raw`
    Raw(RawVolume),
    /// `type: persistent`
    Persistent(PersistentVolume),
    /// `type: secret`
    Secret(ProjectedVolume),
    /// `type: configMap`
    ConfigMap(ProjectedVolume),
}

impl VolumeSource {
    /// The discriminator matching this variant.
    #[must_use]
    pub const fn volume_type(&self) -> VolumeType {
        match self {
            Self::Tmpfs => VolumeType::Tmpfs,
            Self::Local => VolumeType::Local,
            Self::Raw(_) => VolumeType::Raw,
            Self::Persistent(_) => VolumeType::Persistent,
            Self::Secret(_) => VolumeType::Secret,
            Self::ConfigMap(_) => VolumeType::ConfigMap,
        }
    }
}

/// A platform volume source written out in full.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVolume {
    /// The volume source fields, without a name.
    pub spec: Map<String, JsonValue>,
}

impl RawVolume {
    /// Build the platform volume for this source under `name`.
    ///
    /// # Errors
    ///
    /// Returns the decoder error when the source fields do not form a volume.
    pub fn to_volume(&self, name: &str) -> Result<corev1::Volume, serde_json::Error> {
        let mut object = self.spec.clone();
        object.insert("name".to_string(), JsonValue::String(name.to_string()));
        serde_json::from_value(JsonValue::Object(object))
    }
}

impl<'de> Deserialize<'de> for RawVolume {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            spec: Map<String, JsonValue>,
        }
        let raw = Raw::deserialize(deserializer)?;
        let volume = RawVolume { spec: raw.spec };
        volume
            .to_volume("raw")
            .map_err(|e| D::Error::custom(format!("invalid raw volume spec: {e}")))?;
        Ok(volume)
    }
}

/// A persistent volume: either an existing claim or a claim to provision.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawPersistentVolume")]
pub enum PersistentVolume {
    /// `existing: true`
    Existing {
        /// Name of the claim to mount.
        pvc_name: String,
    },
    /// `existing: false`
    New(NewClaim),
}

/// The spec of a claim to provision.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClaim {
    /// Access modes; empty means the platform default chosen at render time.
    pub access_modes: Vec<String>,
    /// Requested size.
    pub size: Quantity,
    /// Storage class of the claim.
    pub storage_class_name: String,
    /// Volume mode override.
    pub volume_mode: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPersistentVolume {
    existing: Option<bool>,
    pvc_name: Option<String>,
    #[serde(default)]
    access_modes: Vec<String>,
    size: Option<String>,
    storage_class_name: Option<String>,
    volume_mode: Option<String>,
}

impl TryFrom<RawPersistentVolume> for PersistentVolume {
    type Error = VariantError;

    fn try_from(raw: RawPersistentVolume) -> Result<Self, Self::Error> {
        let missing = |field| VariantError::MissingField {
            variant: "persistent",
            field,
        };
        match raw.existing {
            None => Err(missing("existing")),
            Some(true) => Ok(Self::Existing {
                pvc_name: raw.pvc_name.ok_or_else(|| missing("pvcName"))?,
            }),
            Some(false) => {
                let size = raw.size.ok_or_else(|| missing("size"))?;
                Ok(Self::New(NewClaim {
                    access_modes: raw.access_modes,
                    size: parse_size(&size)?,
                    storage_class_name: raw
                        .storage_class_name
                        .ok_or_else(|| missing("storageClassName"))?,
                    volume_mode: raw.volume_mode,
                }))
            }
        }
    }
}

/// Payload shared by secret and config map projections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedVolume {
    /// Name of the projected secret or config map.
    pub name: String,
    /// File mode override.
    pub mode: Option<i32>,
    /// File path to key; a missing key means the path itself.
    pub items: BTreeMap<String, Option<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSecretVolume {
    secret_name: String,
    #[serde(default)]
    mode: Option<i32>,
    #[serde(default)]
    items: BTreeMap<String, Option<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfigMapVolume {
    config_map_name: String,
    #[serde(default)]
    mode: Option<i32>,
    #[serde(default)]
    items: BTreeMap<String, Option<String>>,
}

#[derive(Deserialize)]
struct VolumeHeader {
    #[serde(rename = "type")]
    kind: String,
    mounts: BTreeMap<String, VolumeMount>,
}

fn payload<T: DeserializeOwned, E: serde::de::Error>(
    raw: Value,
    volume_type: VolumeType,
) -> Result<T, E> {
    serde_yaml::from_value(raw).map_err(|e| E::custom(format!("{volume_type} volume: {e}")))
}

impl<'de> Deserialize<'de> for Volume {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let header: VolumeHeader = serde_yaml::from_value(raw.clone()).map_err(D::Error::custom)?;
        let volume_type: VolumeType = header.kind.parse().map_err(D::Error::custom)?;

        let source = match volume_type {
            VolumeType::Tmpfs => VolumeSource::Tmpfs,
            VolumeType::Local => VolumeSource::Local,
            VolumeType::Raw => VolumeSource::Raw(payload::<_, D::Error>(raw, volume_type)?),
            VolumeType::Persistent => {
                VolumeSource::Persistent(payload::<_, D::Error>(raw, volume_type)?)
            }
            VolumeType::Secret => {
                let v: RawSecretVolume = payload::<_, D::Error>(raw, volume_type)?;
                VolumeSource::Secret(ProjectedVolume {
                    name: v.secret_name,
                    mode: v.mode,
                    items: v.items,
                })
            }
            VolumeType::ConfigMap => {
                let v: RawConfigMapVolume = payload::<_, D::Error>(raw, volume_type)?;
                VolumeSource::ConfigMap(ProjectedVolume {
                    name: v.config_map_name,
                    mode: v.mode,
                    items: v.items,
                })
            }
        };

        Ok(Self {
            mounts: header.mounts,
            source,
        })
    }
}
