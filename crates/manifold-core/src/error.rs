//! Common error types for manifold.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the shared naming primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A required metadata field is empty.
    #[error("metadata field `{field}` must not be empty")]
    EmptyMetadata {
        /// The offending field.
        field: &'static str,
    },
}
