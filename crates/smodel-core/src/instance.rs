//! # Model Instances and Projection
//!
//! An [`Instance`] owns one value slot per descriptor of its schema. Slots
//! are allocated fresh at construction, so instances never share state
//! with their schema or with each other (except through `by_reference`
//! handles the caller chose to share).
//!
//! ## Projection
//!
//! [`Instance::iter`] yields `(effective name, value)` pairs in declaration
//! order, where the effective name is the alias if one is declared. Unset
//! attributes are skipped under `hide_unset` and read as null otherwise.
//! [`Instance::project`] flattens nested instances into an ordered
//! `serde_json::Value`; stored values stay live until then.
//!
//! ## Equality
//!
//! Two instances are equal when their schemas are compatible (same model,
//! or one extends the other) and their projections are equal. Policy and
//! descriptor configuration do not take part.

use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{ImmutableFieldError, LookupError, MutationError};
use crate::schema::ModelSchema;
use crate::value::{InputMap, Value};

/// Instance-local state of one attribute.
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    /// `None` is the unset marker.
    value: Option<Value>,
    mutable: bool,
}

impl Slot {
    pub(crate) fn new(value: Option<Value>, mutable: bool) -> Self {
        Self { value, mutable }
    }
}

/// A validated model instance.
#[derive(Debug, Clone)]
pub struct Instance {
    schema: Arc<ModelSchema>,
    slots: Vec<Slot>,
    extras: InputMap,
}

impl Instance {
    pub(crate) fn from_parts(schema: Arc<ModelSchema>, slots: Vec<Slot>, extras: InputMap) -> Self {
        debug_assert_eq!(schema.len(), slots.len());
        Self {
            schema,
            slots,
            extras,
        }
    }

    /// The schema this instance was constructed from.
    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    /// Read a field by canonical name or alias.
    ///
    /// `Ok(None)` means the attribute is unset.
    ///
    /// # Errors
    ///
    /// [`LookupError`] if neither a name nor an alias matches.
    pub fn get(&self, key: &str) -> Result<Option<&Value>, LookupError> {
        let index = self.index_of(key)?;
        Ok(self.slots[index].value.as_ref())
    }

    /// Effective mutability of a field.
    ///
    /// # Errors
    ///
    /// [`LookupError`] if neither a name nor an alias matches.
    pub fn is_mutable(&self, key: &str) -> Result<bool, LookupError> {
        let index = self.index_of(key)?;
        Ok(self.slots[index].mutable)
    }

    /// Cast `value` with the attribute's descriptor and store it.
    ///
    /// # Errors
    ///
    /// - `Lookup` if the key matches no attribute.
    /// - `Immutable` if the attribute's effective mutability is false.
    /// - `Cast` if the new value is rejected.
    ///
    /// On error the prior value is left untouched.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), MutationError> {
        self.assign(key, Some(value.into()))
    }

    /// Re-resolve a field as if its input were missing.
    ///
    /// Optional attributes become unset, defaulted ones take a fresh
    /// default, required ones fail with a `Cast` error.
    ///
    /// # Errors
    ///
    /// As for [`Instance::set`].
    pub fn reset(&mut self, key: &str) -> Result<(), MutationError> {
        self.assign(key, None)
    }

    fn assign(&mut self, key: &str, value: Option<Value>) -> Result<(), MutationError> {
        let index = self.index_of(key)?;
        let descriptor = &self.schema.descriptors()[index];
        if !self.slots[index].mutable {
            return Err(ImmutableFieldError {
                model: self.schema.name().to_string(),
                attribute: descriptor.name().to_string(),
            }
            .into());
        }
        let resolved = descriptor.cast(value)?;
        self.slots[index].value = resolved;
        Ok(())
    }

    /// Projected `(effective name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> + '_ {
        let hide_unset = self.schema.policy().hide_unset;
        self.schema
            .descriptors()
            .iter()
            .zip(&self.slots)
            .filter(move |(_, slot)| !(hide_unset && slot.value.is_none()))
            .map(|(descriptor, slot)| (descriptor.effective_name(), slot.value.as_ref()))
    }

    /// Effective names of the projected attributes, in declaration order.
    pub fn keys(&self) -> Vec<&str> {
        self.iter().map(|(name, _)| name).collect()
    }

    /// Returns true if `key` names an attribute holding a non-null value.
    pub fn contains(&self, key: &str) -> bool {
        matches!(self.get(key), Ok(Some(value)) if !value.is_null())
    }

    /// Unknown input keys accepted under [`UnknownPolicy::Ignore`](crate::UnknownPolicy::Ignore).
    pub fn extras(&self) -> &InputMap {
        &self.extras
    }

    /// Ordered plain view: nested instances become objects, unset becomes null.
    pub fn project(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.iter()
                .map(|(name, value)| {
                    let json = value.map_or(serde_json::Value::Null, Value::to_json);
                    (name.to_string(), json)
                })
                .collect(),
        )
    }

    /// Set fields keyed by effective name, with live values.
    ///
    /// Feeding the result back into construction rebuilds an equal instance
    /// for idempotent casters.
    pub fn to_input_map(&self) -> InputMap {
        self.schema
            .descriptors()
            .iter()
            .zip(&self.slots)
            .filter_map(|(descriptor, slot)| {
                slot.value
                    .as_ref()
                    .map(|value| (descriptor.effective_name().to_string(), value.clone()))
            })
            .collect()
    }

    pub(crate) fn detached(self) -> Instance {
        Instance {
            schema: self.schema,
            slots: self
                .slots
                .into_iter()
                .map(|slot| Slot {
                    value: slot.value.map(Value::detach),
                    mutable: slot.mutable,
                })
                .collect(),
            extras: self
                .extras
                .into_iter()
                .map(|(k, v)| (k, v.detach()))
                .collect(),
        }
    }

    fn index_of(&self, key: &str) -> Result<usize, LookupError> {
        self.schema.position(key).ok_or_else(|| LookupError {
            model: self.schema.name().to_string(),
            key: key.to_string(),
        })
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.schema.is_compatible(&other.schema) && self.project() == other.project()
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.project())
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries: Vec<_> = self.iter().collect();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (name, value) in entries {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeDescriptor;
    use crate::caster::Caster;
    use crate::error::CastFailure;
    use crate::policy::ModelPolicy;
    use serde_json::json;

    fn test_model(mutable: bool) -> Arc<ModelSchema> {
        ModelSchema::new("TestModel")
            .with_policy(ModelPolicy::default().mutable(mutable))
            .attribute(AttributeDescriptor::new("foo", Caster::String).help("foo is a str"))
            .unwrap()
            .attribute(
                AttributeDescriptor::new("bar", Caster::Integer)
                    .optional()
                    .mutable(false),
            )
            .unwrap()
            .attribute(AttributeDescriptor::new("baz", Caster::Integer).default(12))
            .unwrap()
            .shared()
    }

    #[test]
    fn test_creation_and_lookup() {
        let m = test_model(true).construct_json(&json!({"foo": "abc"})).unwrap();
        assert_eq!(m.get("foo").unwrap().and_then(Value::as_str), Some("abc"));
        assert_eq!(m.get("baz").unwrap().and_then(Value::as_i64), Some(12));
        assert!(m.get("bar").unwrap().is_none());
        assert!(m.get("fooo").is_err());
    }

    #[test]
    fn test_mutability() {
        let mut m = test_model(true).construct_json(&json!({"foo": "abc"})).unwrap();
        m.set("foo", "fofo").unwrap();
        assert_eq!(m.get("foo").unwrap().and_then(Value::as_str), Some("fofo"));

        let err = m.set("bar", 1).unwrap_err();
        assert!(matches!(err, MutationError::Immutable(_)));
        assert!(m.get("bar").unwrap().is_none());
    }

    #[test]
    fn test_model_default_immutability() {
        let mut m = test_model(false).construct_json(&json!({"foo": "abc"})).unwrap();
        assert!(!m.is_mutable("foo").unwrap());
        assert!(matches!(m.set("foo", "x"), Err(MutationError::Immutable(_))));
        assert_eq!(m.get("foo").unwrap().and_then(Value::as_str), Some("abc"));
    }

    #[test]
    fn test_failed_set_keeps_prior_value() {
        let mut m = test_model(true).construct_json(&json!({"foo": "abc", "baz": 1})).unwrap();
        let err = m.set("baz", "not a number").unwrap_err();
        match err {
            MutationError::Cast(e) => assert!(matches!(e.failure, CastFailure::Invalid(_))),
            other => panic!("Expected Cast, got: {other}"),
        }
        assert_eq!(m.get("baz").unwrap().and_then(Value::as_i64), Some(1));
    }

    #[test]
    fn test_reset_restores_default() {
        let mut m = test_model(true).construct_json(&json!({"foo": "abc", "baz": 1})).unwrap();
        m.reset("baz").unwrap();
        assert_eq!(m.get("baz").unwrap().and_then(Value::as_i64), Some(12));
        assert!(matches!(m.reset("foo"), Err(MutationError::Cast(_))));
    }

    #[test]
    fn test_projection_order_and_unset() {
        let m = test_model(true).construct_json(&json!({"foo": "abc"})).unwrap();
        assert_eq!(m.keys(), vec!["foo", "bar", "baz"]);
        assert_eq!(m.to_string(), r#"{"foo":"abc","bar":null,"baz":12}"#);
        assert!(!m.contains("bar"));
        assert!(m.contains("foo"));
    }

    #[test]
    fn test_hide_unset() {
        let schema = ModelSchema::extending("Hidden", &test_model(true))
            .with_policy(ModelPolicy::default().hide_unset(true))
            .shared();
        let m = schema.construct_json(&json!({"foo": "abc"})).unwrap();
        assert_eq!(m.keys(), vec!["foo", "baz"]);
        assert_eq!(m.project(), json!({"foo": "abc", "baz": 12}));
    }

    #[test]
    fn test_alias_used_in_projection_and_lookup() {
        let schema = ModelSchema::new("AliasModel")
            .attribute(AttributeDescriptor::new("foobar", Caster::String).alias("@foobar"))
            .unwrap()
            .shared();
        let a = schema.construct_json(&json!({"@foobar": "abc"})).unwrap();
        let b = schema.construct_json(&json!({"foobar": "abc"})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.get("@foobar").unwrap(), a.get("foobar").unwrap());
        assert_eq!(a.project(), json!({"@foobar": "abc"}));
    }

    #[test]
    fn test_equality_ignores_policy_but_not_model() {
        let base = test_model(true);
        let frozen = ModelSchema::extending("Frozen", &base)
            .with_policy(ModelPolicy::default().mutable(false))
            .shared();
        let a = base.construct_json(&json!({"foo": "abc"})).unwrap();
        let b = frozen.construct_json(&json!({"foo": "abc"})).unwrap();
        assert_eq!(a, b);

        let other = ModelSchema::new("Other")
            .attribute(AttributeDescriptor::new("foo", Caster::String))
            .unwrap()
            .shared();
        let c = other.construct_json(&json!({"foo": "abc"})).unwrap();
        assert_eq!(c.project(), json!({"foo": "abc"}));
        assert_ne!(a, c);
    }

    #[test]
    fn test_same_name_different_schema_not_equal() {
        let a = test_model(true).construct_json(&json!({"foo": "abc"})).unwrap();
        let b = test_model(true).construct_json(&json!({"foo": "abc"})).unwrap();
        assert_eq!(a.project(), b.project());
        assert_ne!(a, b);
    }

    #[test]
    fn test_equality_symmetric_across_extension() {
        let parent = test_model(true);
        let child = ModelSchema::extending("Child", &parent).shared();
        let a = parent.construct_json(&json!({"foo": "abc"})).unwrap();
        let b = child.construct_json(&json!({"foo": "abc"})).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, a);
    }

    #[test]
    fn test_serialize_preserves_declaration_order() {
        let m = test_model(true)
            .construct_json(&json!({"baz": 3, "foo": "abc", "bar": 1}))
            .unwrap();
        assert_eq!(
            serde_json::to_string(&m).unwrap(),
            r#"{"foo":"abc","bar":1,"baz":3}"#
        );
    }

    #[test]
    fn test_instances_are_independent() {
        let schema = ModelSchema::new("Listy")
            .with_policy(ModelPolicy::default().mutable(true))
            .attribute(AttributeDescriptor::new("items", Caster::list(Caster::Integer)).default(vec![1]))
            .unwrap()
            .shared();
        let mut a = schema.construct(InputMap::new()).unwrap();
        let b = schema.construct(InputMap::new()).unwrap();
        a.set("items", vec![1, 2, 3]).unwrap();
        assert_eq!(b.project(), json!({"items": [1]}));
        assert_eq!(a.project(), json!({"items": [1, 2, 3]}));
    }
}
