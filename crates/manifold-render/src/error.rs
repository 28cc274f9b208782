//! Error types for canonicalization and rendering.

use thiserror::Error;

/// Errors raised after the input model has been validated.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A container host could not be canonicalized.
    #[error("error validating {host}: {reason}")]
    Canonicalize {
        /// The container or container host at fault.
        host: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A generator hit an invariant local to its resource category.
    #[error("{generator}: {reason}")]
    Generator {
        /// Name of the failing generator.
        generator: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// Two containers project external secrets under the same name.
    #[error("duplicate external secret name '{name}' in multiple containers")]
    DuplicateSecret {
        /// The colliding name.
        name: String,
    },

    /// Autoscaler bounds are out of order.
    #[error("autoscaling 'maxReplicas' ({max}) cannot be lower than 'minReplicas' ({min})")]
    ReplicaRange {
        /// Declared lower bound.
        min: i32,
        /// Declared upper bound.
        max: i32,
    },

    /// Both disruption budget expressions are set.
    #[error("you cannot specify both 'minAvailable' and 'maxUnavailable' in a PodDisruptionBudget")]
    ConflictingBudget,

    /// A volume cannot be assembled into a pod.
    #[error("invalid volume '{volume}': {reason}")]
    InvalidVolume {
        /// Volume name.
        volume: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An object could not be converted to or from its JSON form.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RenderError {
    /// Build a [`RenderError::Canonicalize`].
    pub fn canonicalize(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Canonicalize {
            host: host.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`RenderError::Generator`].
    pub fn generator(generator: &'static str, reason: impl Into<String>) -> Self {
        Self::Generator {
            generator,
            reason: reason.into(),
        }
    }

    /// Whether the error is caused by the input document rather than the compiler.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Serialization(_))
    }
}

/// A specialized Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors() {
        assert!(RenderError::ConflictingBudget.is_user_error());
        assert!(RenderError::ReplicaRange { min: 5, max: 3 }.is_user_error());
        let json_err = serde_json::from_str::<u8>("x").unwrap_err();
        assert!(!RenderError::from(json_err).is_user_error());
    }

    #[test]
    fn messages_carry_context() {
        let err = RenderError::canonicalize("sidecar 'proxy'", "missing tag");
        assert_eq!(err.to_string(), "error validating sidecar 'proxy': missing tag");
        let err = RenderError::ReplicaRange { min: 5, max: 3 };
        assert!(err.to_string().contains("(3)"));
    }
}
