//! Error types for decoding and validating input documents.

use manifold_core::CoreError;
use thiserror::Error;

/// A result type using `SchemaError`.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while turning a document into a validated input model.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The document is not valid YAML or does not match the expected shape.
    #[error("unmarshalling error: {0}")]
    Decode(#[from] serde_yaml::Error),

    /// A field is present but its value is not acceptable.
    #[error("validation error: field `{field}`: {reason}")]
    Validation {
        /// Path of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A rule spanning several fields failed.
    #[error("validation error: {0}")]
    CrossField(String),
}

impl SchemaError {
    /// Build a [`SchemaError::Validation`].
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Line and column of a decode error, when the decoder knows them.
    #[must_use]
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            Self::Decode(e) => e.location().map(|l| (l.line(), l.column())),
            _ => None,
        }
    }
}

impl From<CoreError> for SchemaError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::EmptyMetadata { field } => Self::validation(field, "must not be empty"),
        }
    }
}
