//! String maps that accept any YAML scalar.
//!
//! Environment values, config map data and node selectors are strings on the
//! cluster side, but `PORT: 8080` or `DEBUG: true` is how people write them.

use std::collections::BTreeMap;

use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

/// Render a scalar as the string the cluster would see.
fn scalar_to_string<E: Error>(key: &str, value: Value) -> Result<String, E> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Tagged(tagged) => scalar_to_string(key, tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => Err(E::custom(format!(
            "value of `{key}` must be a scalar, found a collection"
        ))),
    }
}

/// Deserialize a `name -> scalar` map into strings.
///
/// # Errors
///
/// Fails when a value is a sequence or a mapping.
pub fn string_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, Value>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, value)| {
            let value = scalar_to_string::<D::Error>(&key, value)?;
            Ok((key, value))
        })
        .collect()
}

/// Deserialize a `name -> (key -> scalar)` map into strings.
///
/// # Errors
///
/// Fails when an inner value is a sequence or a mapping.
pub fn nested_string_map<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, BTreeMap<String, Value>>::deserialize(deserializer)?
        .into_iter()
        .map(|(name, data)| {
            let data: BTreeMap<String, String> = data
                .into_iter()
                .map(|(key, value)| {
                    let value = scalar_to_string::<D::Error>(&key, value)?;
                    Ok((key, value))
                })
                .collect::<Result<_, D::Error>>()?;
            Ok((name, data))
        })
        .collect()
}
