//! Resource quantity grammar.
//!
//! Quantities are kept as strings on the wire; this module only checks that
//! a string follows the platform grammar and rewrites bare YAML numbers in
//! quantity positions into strings before typed decoding.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde_yaml::Value;
use thiserror::Error;

const BINARY_SUFFIXES: [&str; 6] = ["Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];
const DECIMAL_SUFFIXES: [&str; 9] = ["n", "u", "m", "k", "M", "G", "T", "P", "E"];

/// Mapping keys whose values are maps of quantities.
const QUANTITY_MAPS: [&str; 3] = ["requests", "limits", "capacity"];

/// Mapping keys whose values are single quantities.
const QUANTITY_KEYS: [&str; 2] = ["size", "sizeLimit"];

/// A string that is not a valid quantity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{input}' is not a valid resource quantity: {reason}")]
pub struct QuantityError {
    /// The rejected input.
    pub input: String,
    /// What is wrong with it.
    pub reason: &'static str,
}

/// Parse and validate a quantity string such as `10Gi`, `500m` or `1e3`.
///
/// # Errors
///
/// Returns [`QuantityError`] when the string does not follow the grammar.
pub fn parse_quantity(input: &str) -> Result<Quantity, QuantityError> {
    let s = input.trim();
    let fail = |reason| QuantityError {
        input: input.to_string(),
        reason,
    };
    if s.is_empty() {
        return Err(fail("empty string"));
    }

    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let number_len = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let (number, suffix) = unsigned.split_at(number_len);

    if !is_number(number) {
        return Err(fail("malformed number"));
    }
    if !is_suffix(suffix) {
        return Err(fail("unknown suffix"));
    }
    Ok(Quantity(s.to_string()))
}

/// Parse a storage size: a quantity that is not negative.
///
/// # Errors
///
/// Returns [`QuantityError`] for malformed or negative input.
pub fn parse_size(input: &str) -> Result<Quantity, QuantityError> {
    let quantity = parse_quantity(input)?;
    if quantity.0.starts_with('-') {
        return Err(QuantityError {
            input: input.to_string(),
            reason: "size must not be negative",
        });
    }
    Ok(quantity)
}

fn is_number(s: &str) -> bool {
    let mut parts = s.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let frac = parts.next();
    let digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    match frac {
        None => !whole.is_empty() && digits(whole),
        Some(frac) => (!whole.is_empty() || !frac.is_empty()) && digits(whole) && digits(frac),
    }
}

fn is_suffix(s: &str) -> bool {
    if s.is_empty() || BINARY_SUFFIXES.contains(&s) || DECIMAL_SUFFIXES.contains(&s) {
        return true;
    }
    s.strip_prefix(['e', 'E']).is_some_and(|exp| {
        let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        !exp.is_empty() && exp.chars().all(|c| c.is_ascii_digit())
    })
}

/// Subtrees emitted as written; their numbers are never quantities of ours.
const PASSTHROUGH_KEYS: [&str; 6] = [
    "extraManifests",
    "additionalConfig",
    "httpRoute",
    "ingress",
    "serviceMonitor",
    "podMonitor",
];

/// Rewrite numbers in quantity positions of a document into strings.
///
/// `resources: {requests: {cpu: 1}}` is accepted by the platform, but the
/// typed quantity only decodes from strings. Pass-through subtrees are left
/// untouched.
pub fn normalize_quantities(value: &mut Value) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map.iter_mut() {
                let key = key.as_str().unwrap_or_default();
                if PASSTHROUGH_KEYS.contains(&key) {
                    continue;
                }
                if QUANTITY_MAPS.contains(&key) {
                    if let Value::Mapping(inner) = child {
                        inner.values_mut().for_each(stringify_number);
                    }
                } else if QUANTITY_KEYS.contains(&key) {
                    stringify_number(child);
                }
                normalize_quantities(child);
            }
        }
        Value::Sequence(seq) => seq.iter_mut().for_each(normalize_quantities),
        Value::Tagged(tagged) => normalize_quantities(&mut tagged.value),
        _ => {}
    }
}

fn stringify_number(value: &mut Value) {
    if let Value::Number(n) = value {
        *value = Value::String(n.to_string());
    }
}
