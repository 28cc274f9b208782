//! Core types and utilities for manifold.
//!
//! This crate provides the naming primitives shared by every stage of the
//! compiler:
//!
//! - **Service identity**: [`ServiceMetadata`] and the derived [`ServiceId`]
//! - **Names**: resource-name derivation and length truncation
//! - **Labels**: the common label set stamped on every generated object
//! - **Build info**: the compiler version embedded into those labels
//!
//! # Example
//!
//! ```
//! use manifold_core::{BuildInfo, ServiceMetadata, names};
//!
//! let metadata = ServiceMetadata::new("apps", "foo", "bar", "test");
//! let id = metadata.service_id();
//! assert_eq!(id.as_str(), "foo--bar--test");
//! assert_eq!(names::pvc_name(&id, "data"), "foo--bar--test--data");
//!
//! let labels = manifold_core::labels::common_labels(&metadata, &BuildInfo::new("1.0.0"), "yoke");
//! assert_eq!(labels["app"], "foo--bar--test");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod build;
pub mod error;
pub mod labels;
pub mod metadata;
pub mod names;

pub use build::BuildInfo;
pub use error::{CoreError, Result};
pub use labels::Labels;
pub use metadata::{ServiceId, ServiceMetadata};
