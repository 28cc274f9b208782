//! Typed custom resources the generators populate.
//!
//! Each type carries its own `apiVersion`/`kind` and implements
//! [`HasApiResource`] for consistent version handling.

pub mod external_secret;
pub mod gateway;
pub mod monitoring;
pub mod postgres;

pub use external_secret::ExternalSecret;
pub use gateway::HttpRoute;
pub use monitoring::{PodMonitor, ServiceMonitor};
pub use postgres::Postgresql;

/// A custom resource with a fixed API version and kind.
pub trait HasApiResource {
    /// Full API version (e.g. `external-secrets.io/v1`).
    const API_VERSION: &'static str;
    /// Resource kind.
    const KIND: &'static str;
}

/// Implement `default_api_version()` and `default_kind()` for a resource type.
macro_rules! impl_api_defaults {
    ($type:ty) => {
        impl $type {
            fn default_api_version() -> String {
                <Self as $crate::crds::HasApiResource>::API_VERSION.to_string()
            }
            fn default_kind() -> String {
                <Self as $crate::crds::HasApiResource>::KIND.to_string()
            }
        }
    };
}

pub(crate) use impl_api_defaults;
