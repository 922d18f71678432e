//! # YAML Input Decoding
//!
//! Converts YAML documents straight into `smodel_core` value trees. YAML
//! tags are ignored and their inner value converted; scalar mapping keys
//! are stringified.

use smodel_core::{InputError, InputMap, Value};

use crate::error::DecodeError;

/// Decode a YAML text whose root is a mapping.
///
/// # Errors
///
/// `DecodeError::Yaml` for malformed text, `DecodeError::Input` for a
/// non-mapping root or an unsupported mapping key.
pub fn from_yaml_str(input: &str) -> Result<InputMap, DecodeError> {
    let doc: serde_yaml::Value = serde_yaml::from_str(input)?;
    Ok(from_yaml_value(&doc)?)
}

/// Convert a decoded YAML mapping into an input map.
///
/// # Errors
///
/// `NotAMapping` for any other root, `Unsupported` for composite keys.
pub fn from_yaml_value(doc: &serde_yaml::Value) -> Result<InputMap, InputError> {
    match yaml_to_value(doc)? {
        Value::Map(entries) => Ok(entries),
        other => Err(InputError::NotAMapping {
            found: other.type_name(),
        }),
    }
}

/// Convert a `serde_yaml::Value` tree into a [`Value`] tree.
pub fn yaml_to_value(yaml: &serde_yaml::Value) -> Result<Value, InputError> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(InputError::Unsupported(format!("YAML number {n}")))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::Str(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, InputError> = seq.iter().map(yaml_to_value).collect();
            Ok(Value::List(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut entries = InputMap::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => {
                        return Err(InputError::Unsupported(format!(
                            "YAML mapping key {other:?}"
                        )))
                    }
                };
                entries.insert(key, yaml_to_value(v)?);
            }
            Ok(Value::Map(entries))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(&tagged.value),
    }
}
