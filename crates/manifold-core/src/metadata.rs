//! Service metadata and the derived service identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The four strings that identify a deployable service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    /// Target namespace of every namespaced object.
    pub namespace: String,
    /// Service name.
    pub service: String,
    /// Component of the service (api, worker, ...).
    pub component: String,
    /// Deployment environment.
    pub environment: String,
}

impl ServiceMetadata {
    /// Create metadata from its four parts.
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        service: impl Into<String>,
        component: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            service: service.into(),
            component: component.into(),
            environment: environment.into(),
        }
    }

    /// Check that every field carries a non-blank value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyMetadata`] naming the first blank field.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("namespace", &self.namespace),
            ("service", &self.service),
            ("component", &self.component),
            ("environment", &self.environment),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(CoreError::EmptyMetadata { field });
            }
        }
        Ok(())
    }

    /// Derive the service identifier.
    #[must_use]
    pub fn service_id(&self) -> ServiceId {
        ServiceId::new(self)
    }
}

/// The derived name `service--component--environment`.
///
/// Base for almost every generated object name and for the `app` label.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceId(String);

impl ServiceId {
    /// Derive the identifier from service metadata.
    #[must_use]
    pub fn new(metadata: &ServiceMetadata) -> Self {
        let id = format!(
            "{}--{}--{}",
            metadata.service, metadata.component, metadata.environment
        );
        Self(id.trim().to_string())
    }

    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceId({})", self.0)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ServiceId> for String {
    fn from(id: ServiceId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn metadata() -> ServiceMetadata {
        ServiceMetadata::new("apps", "foo", "bar", "test")
    }

    #[test]
    fn service_id_joins_with_double_dash() {
        assert_eq!(metadata().service_id().as_str(), "foo--bar--test");
    }

    #[test]
    fn service_id_display_and_debug() {
        let id = metadata().service_id();
        assert_eq!(id.to_string(), "foo--bar--test");
        assert_eq!(format!("{id:?}"), "ServiceId(foo--bar--test)");
    }

    #[test]
    fn validate_rejects_blank_field() {
        let mut m = metadata();
        m.component = "  ".into();
        assert_eq!(
            m.validate(),
            Err(CoreError::EmptyMetadata { field: "component" })
        );
        assert!(metadata().validate().is_ok());
    }

    #[test]
    fn metadata_deserializes_from_json() {
        let m: ServiceMetadata = serde_json::from_str(
            r#"{"namespace":"ns","service":"s","component":"c","environment":"e"}"#,
        )
        .unwrap();
        assert_eq!(m, ServiceMetadata::new("ns", "s", "c", "e"));
    }

    proptest! {
        #[test]
        fn service_id_shape(
            service in "[a-z][a-z0-9]{0,15}",
            component in "[a-z][a-z0-9]{0,15}",
            environment in "[a-z][a-z0-9]{0,15}",
        ) {
            let m = ServiceMetadata::new("ns", service.clone(), component.clone(), environment.clone());
            let id = m.service_id();
            prop_assert_eq!(
                id.as_str(),
                format!("{service}--{component}--{environment}")
            );
        }
    }
}
