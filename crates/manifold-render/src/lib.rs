//! Canonicalization and resource generation for manifold.
//!
//! This crate turns a validated [`manifold_schema::InputValues`] into the
//! ordered list of platform objects:
//!
//! - **Canonicalization**: [`prepare_values`] resolves container names and
//!   image tags into a [`DeploymentValues`]
//! - **Pod assembly**: one shared builder for workload, job and cronjob pods
//! - **Generators**: a fixed, ordered list of (predicate, factory) pairs
//! - **Pipeline**: [`render`] runs them and collects [`Manifest`]s
//!
//! # Example
//!
//! ```
//! use manifold_render::{compile, RenderConfig};
//!
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
//! let input = manifold_schema::parse_values(doc).unwrap();
//! let manifests = compile(input, &RenderConfig::default()).unwrap();
//! assert_eq!(manifests[0].kind(), Some("Deployment"));
//! assert_eq!(manifests[0].name(), Some("foo--api--prod"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod container;
pub mod crds;
pub mod error;
pub mod generators;
pub mod manifest;
pub mod pipeline;
pub mod pod;
pub mod prepare;
pub mod values;

pub use config::RenderConfig;
pub use error::{RenderError, Result};
pub use generators::{Generator, GENERATORS};
pub use manifest::Manifest;
pub use pipeline::{compile, render, to_json};
pub use prepare::prepare_values;
pub use values::{Container, Cronjob, DeploymentValues, Image, PodValues, PreDeploymentJob};
