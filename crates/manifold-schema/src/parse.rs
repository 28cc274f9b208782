//! Document entry point: text in, validated input model out.

use serde_yaml::Value;
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::input::InputValues;
use crate::quantity::normalize_quantities;
use crate::validate::{validate_cross_field, validate_structure};

/// Decode and validate a configuration document.
///
/// Runs variant resolution during decoding, then structural validation,
/// then the cross-field rules. The first failure is returned.
///
/// # Errors
///
/// Returns [`SchemaError::Decode`] for malformed documents or type
/// mismatches, [`SchemaError::Validation`] for structural violations and
/// [`SchemaError::CrossField`] for a failing cross-field rule.
pub fn parse_values(text: &str) -> Result<InputValues> {
    let mut doc: Value = serde_yaml::from_str(text)?;
    if !doc.is_mapping() {
        return Err(SchemaError::validation("<document>", "must be a mapping"));
    }
    normalize_quantities(&mut doc);

    let mut values: InputValues = serde_yaml::from_value(doc)?;
    validate_structure(&values)?;
    values.workload_kind = validate_cross_field(&values)?;

    debug!(
        namespace = %values.metadata.namespace,
        service = %values.metadata.service,
        "parsed configuration"
    );
    Ok(values)
}
