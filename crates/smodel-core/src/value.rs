//! # Dynamic Values
//!
//! [`Value`] is the loosely typed currency of the engine: raw input maps are
//! made of values, casters convert values into values, and instance slots
//! store values. Unlike `serde_json::Value` it can hold live nested
//! [`Instance`]s and by-reference [`SharedValue`] handles.
//!
//! ## Copy Semantics
//!
//! `Clone` on a `Value` is a deep copy of everything except `Shared`
//! handles, which clone the handle. [`Value::detach`] additionally
//! replaces every shared handle by a snapshot of its content; this is the
//! defensive copy applied before casting unless an attribute is marked
//! `by_reference`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::instance::Instance;

/// Named raw inputs handed to construction, keyed by name or alias.
pub type InputMap = BTreeMap<String, Value>;

/// A dynamically typed value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Ordered sequence.
    List(Vec<Value>),
    /// String-keyed mapping.
    Map(InputMap),
    /// A live, already constructed model instance.
    Model(Instance),
    /// A handle shared with the caller, retained by `by_reference` attributes.
    Shared(SharedValue),
}

impl Value {
    /// Name of the runtime type, used in cast failures.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "mapping",
            Self::Model(_) => "model",
            Self::Shared(_) => "shared",
        }
    }

    /// Returns true for an explicit null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// String payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Float payload; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Boolean payload.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// List elements.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Mapping entries.
    pub fn as_map(&self) -> Option<&InputMap> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Nested model instance.
    pub fn as_model(&self) -> Option<&Instance> {
        match self {
            Self::Model(instance) => Some(instance),
            _ => None,
        }
    }

    /// Shared handle.
    pub fn as_shared(&self) -> Option<&SharedValue> {
        match self {
            Self::Shared(handle) => Some(handle),
            _ => None,
        }
    }

    /// Deep copy that also severs every shared handle.
    ///
    /// The result contains no `Shared` variant at any depth, so nothing the
    /// caller still holds can observe later changes to it (or vice versa).
    pub fn detach(self) -> Value {
        match self {
            Self::List(items) => Self::List(items.into_iter().map(Value::detach).collect()),
            Self::Map(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.detach()))
                    .collect(),
            ),
            Self::Model(instance) => Self::Model(instance.detached()),
            Self::Shared(handle) => handle.snapshot().detach(),
            other => other,
        }
    }

    /// Flatten into a plain `serde_json::Value`.
    ///
    /// Nested instances become ordered objects, shared handles are read,
    /// and non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::Float(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Model(instance) => instance.project(),
            Self::Shared(handle) => handle.read().to_json(),
        }
    }
}

/// Values compare by their flattened projection, so a nested instance equals
/// the mapping it projects to.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.to_json() == other.to_json()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Float(n) if n.is_finite() => serializer.serialize_f64(*n),
            Self::Float(_) => serializer.serialize_unit(),
            Self::Str(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Self::Model(instance) => instance.serialize(serializer),
            Self::Shared(handle) => handle.read().serialize(serializer),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                // u64 beyond i64::MAX and true floats both land here.
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        Self::from(value.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<InputMap> for Value {
    fn from(entries: InputMap) -> Self {
        Self::Map(entries)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Self::Model(instance)
    }
}

impl From<SharedValue> for Value {
    fn from(handle: SharedValue) -> Self {
        Self::Shared(handle)
    }
}

/// A value shared between the caller and every instance that retained it.
///
/// Only attributes declared `by_reference` keep the handle; all others
/// store a detached snapshot. Writes through the handle are visible to
/// every holder, which is the caller's explicit liability.
#[derive(Debug, Clone)]
pub struct SharedValue(Arc<RwLock<Value>>);

impl SharedValue {
    /// Wrap a value into a new shared handle.
    pub fn new(value: impl Into<Value>) -> Self {
        Self(Arc::new(RwLock::new(value.into())))
    }

    /// Read access to the shared content.
    pub fn read(&self) -> RwLockReadGuard<'_, Value> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access to the shared content.
    pub fn write(&self) -> RwLockWriteGuard<'_, Value> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clone of the current content.
    pub fn snapshot(&self) -> Value {
        self.read().clone()
    }

    /// Returns true if both handles point at the same shared content.
    pub fn ptr_eq(&self, other: &SharedValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
