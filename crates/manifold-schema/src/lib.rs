//! Input model and validation for manifold.
//!
//! This crate turns a YAML configuration document into a validated
//! [`InputValues`]:
//!
//! - **Variant resolution**: tagged-union fields (volumes, ingress) are
//!   resolved to one concrete variant while decoding
//! - **Quantities**: resource quantity grammar and normalization
//! - **Validation**: structural checks followed by cross-field rules
//!
//! # Example
//!
//! ```
//! let doc = "
//! namespace: apps
//! service: foo
//! component: api
//! environment: prod
//! image:
//!   repository: registry/foo
//!   tag: v1
//! ports:
//!   - port: 8080
//! ";
//! let values = manifold_schema::parse_values(doc).unwrap();
//! assert_eq!(values.metadata.service_id().as_str(), "foo--api--prod");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ingress;
pub mod input;
pub mod parse;
pub mod quantity;
pub mod scalar;
pub mod validate;
pub mod volume;

pub use error::{Result, SchemaError};
pub use ingress::{HttpRoute, Ingress, IngressVariant};
pub use input::{
    Autoscaling, ContainerSpec, CronjobSpec, Database, ExternalSecretDefinition, ImageSpec,
    InitContainerSpec, InputValues, JobOptions, PodMonitorSpec, PortSpec, PreDeploymentJobSpec,
    RoleGrant, SecretMapping, SecretStoreRef, ServiceAccountSpec, ServiceMonitorSpec,
    StatefulSetOptions, Volumes, WorkloadKind,
};
pub use parse::parse_values;
pub use quantity::{parse_quantity, parse_size, QuantityError};
pub use volume::{
    NewClaim, PersistentVolume, ProjectedVolume, RawVolume, VariantError, Volume, VolumeMount,
    VolumeSource, VolumeType,
};
