//! # Model Documents
//!
//! The serde shape of declarative model files:
//!
//! ```yaml
//! models:
//!   - name: Data
//!     policy: { unknown: strict }
//!     attributes:
//!       - { name: name, type: string }
//!       - { name: some_value, type: string, optional: true }
//!       - { name: another_value, type: integer, default: 0 }
//!       - { name: tags, type: { list: string }, default: [] }
//!   - name: Tagged
//!     extends: Data
//!     attributes:
//!       - { name: kind, type: { one_of: [a, b] } }
//! ```
//!
//! Documents are pure data; resolving type names into casters is the
//! registry's job.

use std::fmt;

use serde::{Deserialize, Serialize};
use smodel_core::ModelPolicy;

/// A file holding any number of model declarations, in dependency order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Declarations in registration order.
    #[serde(default)]
    pub models: Vec<ModelDocument>,
}

/// Declaration of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDocument {
    /// Model name; later lookups and `extends` refer to it.
    pub name: String,
    /// Registered model whose attributes and policy are inherited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// Overrides the inherited (or default) policy as a whole.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<ModelPolicy>,
    /// Attributes added after the inherited ones.
    #[serde(default)]
    pub attributes: Vec<AttributeDocument>,
}

/// Declaration of one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeDocument {
    /// Canonical attribute name.
    pub name: String,
    /// Target type, written as `type`.
    #[serde(rename = "type")]
    pub type_spec: TypeSpec,
    /// Alternate input and projection key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Missing input leaves the attribute unset.
    #[serde(default)]
    pub optional: bool,
    /// Explicit null is stored as null.
    #[serde(default)]
    pub nullable: bool,
    /// Fallback value. An explicit `default: null` is the same as none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// Overrides the model-wide mutability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutable: Option<bool>,
    /// Store shared values as handles instead of snapshots.
    #[serde(default)]
    pub by_reference: bool,
    /// Free-form description shown in error messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

/// Target type of an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    /// Built-in type, registered caster, or registered model.
    Named(String),
    /// `{ list: <type> }`
    List {
        /// Element type.
        list: Box<TypeSpec>,
    },
    /// `{ one_of: [..] }`
    OneOf {
        /// Accepted literals.
        one_of: Vec<serde_json::Value>,
    },
    /// `{ date: <chrono format> }`
    Date {
        /// Input format string.
        date: String,
    },
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::List { list } => write!(f, "list<{list}>"),
            Self::OneOf { one_of } => write!(f, "one_of{}", serde_json::Value::from(one_of.clone())),
            Self::Date { date } => write!(f, "date({date})"),
        }
    }
}
