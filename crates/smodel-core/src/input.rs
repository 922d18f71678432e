//! # Input Adapters
//!
//! Decode raw documents into the [`InputMap`] handed to construction. Only
//! mappings are accepted at the root; nested values are converted as-is
//! and left for the casters to judge.

use crate::error::InputError;
use crate::value::{InputMap, Value};

/// Decode a JSON text whose root is an object.
///
/// # Errors
///
/// `Json` for malformed text, `NotAMapping` for any other root.
pub fn from_json_str(input: &str) -> Result<InputMap, InputError> {
    let doc: serde_json::Value = serde_json::from_str(input)?;
    from_json_value(&doc)
}

/// Convert a decoded JSON object into an input map.
///
/// # Errors
///
/// `NotAMapping` if `input` is not an object.
pub fn from_json_value(input: &serde_json::Value) -> Result<InputMap, InputError> {
    match input {
        serde_json::Value::Object(entries) => Ok(entries
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v)))
            .collect()),
        other => Err(InputError::NotAMapping {
            found: Value::from(other).type_name(),
        }),
    }
}
