//! # Attribute Descriptors
//!
//! An [`AttributeDescriptor`] describes one named field of a model: its
//! [`Caster`], optionality, nullability, fallback, alias, mutability and
//! copy policy. Descriptors are built through [`AttributeBuilder`], which
//! validates the declaration eagerly so that a malformed descriptor never
//! reaches instantiation.
//!
//! ## Resolution Order
//!
//! [`AttributeDescriptor::cast`] takes `None` for a missing value and
//! `Some(Value::Null)` for an explicit null:
//!
//! 1. Missing: optional → unset; else the fallback; else `Missing`.
//! 2. Null: nullable → null; optional → unset; else the fallback; else
//!    `Null`.
//! 3. The value (possibly a fallback) is detached unless `by_reference`,
//!    then handed to the caster.
//!
//! Optional attributes never consult their fallback. An unset attribute
//! projects as null, so re-casting a projection yields unset again.

use std::fmt;
use std::sync::Arc;

use crate::caster::Caster;
use crate::error::{CastError, CastFailure, DeclarationError};
use crate::value::Value;

/// Produces a fresh fallback value on every call.
pub type DefaultFactory = Arc<dyn Fn() -> Value + Send + Sync>;

#[derive(Clone)]
enum Fallback {
    Value(Value),
    Factory(DefaultFactory),
}

impl Fallback {
    fn resolve(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Declaration of one model attribute.
#[derive(Debug, Clone)]
pub struct AttributeDescriptor {
    name: String,
    caster: Caster,
    alias: Option<String>,
    optional: bool,
    nullable: bool,
    fallback: Option<Fallback>,
    mutable: Option<bool>,
    by_reference: bool,
    help: Option<String>,
}

impl AttributeDescriptor {
    /// Start a declaration without a caster.
    ///
    /// [`AttributeBuilder::build`] fails with `MissingCaster` unless
    /// [`AttributeBuilder::caster`] is called.
    pub fn builder(name: impl Into<String>) -> AttributeBuilder {
        AttributeBuilder {
            name: name.into(),
            caster: None,
            alias: None,
            optional: false,
            nullable: false,
            fallback_value: None,
            fallback_factory: None,
            mutable: None,
            by_reference: false,
            help: None,
        }
    }

    /// Start a declaration with its caster.
    pub fn new(name: impl Into<String>, caster: Caster) -> AttributeBuilder {
        Self::builder(name).caster(caster)
    }

    /// Canonical attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Caster applied to supplied values.
    pub fn caster(&self) -> &Caster {
        &self.caster
    }

    /// Alternate input and projection key.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Key used in projections: the alias if any, else the name.
    pub fn effective_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Missing input leaves the attribute unset.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Explicit null is stored as null.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns true if a fallback value or factory is set.
    pub fn has_default(&self) -> bool {
        self.fallback.is_some()
    }

    /// Per-attribute mutability override; `None` defers to the model policy.
    pub fn mutable(&self) -> Option<bool> {
        self.mutable
    }

    /// Shared values are stored as handles.
    pub fn is_by_reference(&self) -> bool {
        self.by_reference
    }

    /// Free-form description shown in error messages.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Returns true if `key` is this attribute's name or alias.
    pub fn matches(&self, key: &str) -> bool {
        self.name == key || self.alias.as_deref() == Some(key)
    }

    /// Effective mutability given the model-level default.
    pub fn effective_mutability(&self, model_default: bool) -> bool {
        self.mutable.unwrap_or(model_default)
    }

    /// Resolve a raw input into the stored slot value.
    ///
    /// `None` input means the key was absent; the `Ok(None)` result is the
    /// unset marker.
    ///
    /// # Errors
    ///
    /// Returns a [`CastError`] carrying the attribute name, this
    /// descriptor's summary, the stringified input and the failure.
    pub fn cast(&self, value: Option<Value>) -> Result<Option<Value>, CastError> {
        let raw = value
            .as_ref()
            .map_or_else(|| "<missing>".to_string(), Value::to_string);

        let resolved = match value {
            None if self.optional => return Ok(None),
            None => self.fallback().ok_or(CastFailure::Missing),
            Some(Value::Null) if self.nullable => return Ok(Some(Value::Null)),
            Some(Value::Null) if self.optional => return Ok(None),
            Some(Value::Null) => self.fallback().ok_or(CastFailure::Null),
            Some(value) => Ok(value),
        };

        resolved
            .and_then(|value| {
                let value = if self.by_reference { value } else { value.detach() };
                self.caster.cast(value)
            })
            .map(Some)
            .map_err(|failure| CastError {
                attribute: self.name.clone(),
                descriptor: self.to_string(),
                value: raw,
                failure,
            })
    }

    fn fallback(&self) -> Option<Value> {
        self.fallback.as_ref().map(Fallback::resolve)
    }
}

/// Summary used in error messages, e.g. `another_value: integer, default=0`.
impl fmt::Display for AttributeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.caster)?;
        if let Some(alias) = &self.alias {
            write!(f, ", alias={alias}")?;
        }
        if self.optional {
            write!(f, ", optional")?;
        }
        if self.nullable {
            write!(f, ", nullable")?;
        }
        match &self.fallback {
            Some(Fallback::Value(value)) => write!(f, ", default={value}")?,
            Some(Fallback::Factory(_)) => write!(f, ", default=<factory>")?,
            None => {}
        }
        if let Some(mutable) = self.mutable {
            write!(f, ", mutable={mutable}")?;
        }
        if self.by_reference {
            write!(f, ", by_reference")?;
        }
        Ok(())
    }
}

/// Builder for [`AttributeDescriptor`].
#[derive(Clone)]
pub struct AttributeBuilder {
    name: String,
    caster: Option<Caster>,
    alias: Option<String>,
    optional: bool,
    nullable: bool,
    fallback_value: Option<Value>,
    fallback_factory: Option<DefaultFactory>,
    mutable: Option<bool>,
    by_reference: bool,
    help: Option<String>,
}

impl AttributeBuilder {
    /// Set the caster.
    pub fn caster(mut self, caster: Caster) -> Self {
        self.caster = Some(caster);
        self
    }

    /// Alternate input key, also accepted by lookups and used in projections.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// A missing value resolves to unset instead of failing.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// An explicit null is stored instead of consulting the fallback.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Fallback value, copied on every use.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.fallback_value = Some(value.into());
        self
    }

    /// Fallback producer, invoked on every use.
    pub fn default_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.fallback_factory = Some(Arc::new(factory));
        self
    }

    /// Override the model-level mutability.
    pub fn mutable(mut self, mutable: bool) -> Self {
        self.mutable = Some(mutable);
        self
    }

    /// Keep shared handles instead of detaching them.
    pub fn by_reference(mut self) -> Self {
        self.by_reference = true;
        self
    }

    /// Attach a help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Validate and produce the descriptor.
    ///
    /// # Errors
    ///
    /// - `EmptyName` for an empty name.
    /// - `MissingCaster` if no caster was set.
    /// - `ConflictingDefaults` if both `default` and `default_factory` were set.
    /// - `InvalidDefault` if the default value fails its own caster.
    pub fn build(self) -> Result<AttributeDescriptor, DeclarationError> {
        if self.name.is_empty() {
            return Err(DeclarationError::EmptyName);
        }
        let caster = self.caster.ok_or_else(|| DeclarationError::MissingCaster {
            attribute: self.name.clone(),
        })?;

        let fallback = match (self.fallback_value, self.fallback_factory) {
            (Some(_), Some(_)) => {
                return Err(DeclarationError::ConflictingDefaults {
                    attribute: self.name,
                })
            }
            (Some(value), None) => {
                caster
                    .cast(value.clone().detach())
                    .map_err(|failure| DeclarationError::InvalidDefault {
                        attribute: self.name.clone(),
                        failure,
                    })?;
                Some(Fallback::Value(value))
            }
            (None, Some(factory)) => Some(Fallback::Factory(factory)),
            (None, None) => None,
        };

        Ok(AttributeDescriptor {
            name: self.name,
            caster,
            alias: self.alias,
            optional: self.optional,
            nullable: self.nullable,
            fallback,
            mutable: self.mutable,
            by_reference: self.by_reference,
            help: self.help,
        })
    }
}

impl fmt::Debug for AttributeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeBuilder")
            .field("name", &self.name)
            .field("caster", &self.caster)
            .field("alias", &self.alias)
            .field("optional", &self.optional)
            .field("nullable", &self.nullable)
            .field("default", &self.fallback_value)
            .field("default_factory", &self.fallback_factory.is_some())
            .field("mutable", &self.mutable)
            .field("by_reference", &self.by_reference)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SharedValue;
    use serde_json::json;

    fn build(builder: AttributeBuilder) -> AttributeDescriptor {
        builder.build().expect("valid declaration")
    }

    #[test]
    fn test_missing_caster_rejected_at_declaration() {
        let err = AttributeDescriptor::builder("name").build().unwrap_err();
        assert!(matches!(err, DeclarationError::MissingCaster { .. }));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = AttributeDescriptor::new("", Caster::String).build().unwrap_err();
        assert!(matches!(err, DeclarationError::EmptyName));
    }

    #[test]
    fn test_conflicting_defaults_rejected() {
        let err = AttributeDescriptor::new("n", Caster::Integer)
            .default(1)
            .default_factory(|| Value::Int(2))
            .build()
            .unwrap_err();
        assert!(matches!(err, DeclarationError::ConflictingDefaults { .. }));
    }

    #[test]
    fn test_invalid_default_rejected() {
        let err = AttributeDescriptor::new("n", Caster::Integer)
            .default("twelve")
            .build()
            .unwrap_err();
        assert!(matches!(err, DeclarationError::InvalidDefault { .. }));
    }

    #[test]
    fn test_missing_required_fails() {
        let attr = build(AttributeDescriptor::new("name", Caster::String));
        let err = attr.cast(None).unwrap_err();
        assert!(matches!(err.failure, CastFailure::Missing));
        assert_eq!(err.value, "<missing>");
        assert_eq!(err.attribute, "name");
    }

    #[test]
    fn test_missing_optional_is_unset() {
        let attr = build(AttributeDescriptor::new("v", Caster::String).optional());
        assert!(attr.cast(None).unwrap().is_none());
    }

    #[test]
    fn test_optional_wins_over_default() {
        let attr = build(AttributeDescriptor::new("v", Caster::Integer).optional().default(5));
        assert!(attr.cast(None).unwrap().is_none());
        assert!(attr.cast(Some(Value::Null)).unwrap().is_none());
    }

    #[test]
    fn test_null_on_optional_is_unset() {
        let attr = build(AttributeDescriptor::new("v", Caster::String).optional());
        assert!(attr.cast(Some(Value::Null)).unwrap().is_none());
    }

    #[test]
    fn test_null_on_optional_nullable_is_stored() {
        let attr = build(AttributeDescriptor::new("v", Caster::String).optional().nullable());
        assert!(attr.cast(Some(Value::Null)).unwrap().unwrap().is_null());
    }

    #[test]
    fn test_builder_starts_empty() {
        let err = AttributeDescriptor::builder("plain").build().unwrap_err();
        assert!(matches!(err, DeclarationError::MissingCaster { attribute } if attribute == "plain"));
        let attr = build(AttributeDescriptor::new("plain", Caster::Any));
        assert!(!attr.is_optional() && !attr.is_nullable() && !attr.has_default());
        assert_eq!(attr.mutable(), None);
        assert!(attr.alias().is_none() && attr.help().is_none());
    }

    #[test]
    fn test_missing_resolves_default() {
        let attr = build(AttributeDescriptor::new("v", Caster::Integer).default(0));
        assert_eq!(attr.cast(None).unwrap().unwrap().as_i64(), Some(0));
    }

    #[test]
    fn test_default_is_cast() {
        let attr = build(AttributeDescriptor::new("v", Caster::Integer).default("12"));
        assert_eq!(attr.cast(None).unwrap().unwrap().as_i64(), Some(12));
    }

    #[test]
    fn test_null_on_nullable_is_stored() {
        let attr = build(AttributeDescriptor::new("v", Caster::Integer).nullable().default(3));
        assert!(attr.cast(Some(Value::Null)).unwrap().unwrap().is_null());
    }

    #[test]
    fn test_null_on_non_nullable_uses_default() {
        let attr = build(AttributeDescriptor::new("v", Caster::Integer).default(3));
        assert_eq!(attr.cast(Some(Value::Null)).unwrap().unwrap().as_i64(), Some(3));
    }

    #[test]
    fn test_null_without_default_fails() {
        let attr = build(AttributeDescriptor::new("v", Caster::Integer));
        let err = attr.cast(Some(Value::Null)).unwrap_err();
        assert!(matches!(err.failure, CastFailure::Null));
        assert_eq!(err.value, "null");
    }

    #[test]
    fn test_default_factory_called_per_resolution() {
        let attr = build(
            AttributeDescriptor::new("items", Caster::list(Caster::Integer))
                .default_factory(|| Value::List(Vec::new())),
        );
        let a = attr.cast(None).unwrap().unwrap();
        let b = attr.cast(None).unwrap().unwrap();
        assert_eq!(a.to_json(), json!([]));
        assert_eq!(b.to_json(), json!([]));
    }

    #[test]
    fn test_cast_error_carries_context() {
        let attr = build(AttributeDescriptor::new("count", Caster::Integer).alias("@count"));
        let err = attr.cast(Some(Value::from("many"))).unwrap_err();
        assert_eq!(err.value, r#""many""#);
        assert!(err.descriptor.contains("alias=@count"));
        assert!(err.to_string().contains("invalid integer literal"));
    }

    #[test]
    fn test_detached_by_default() {
        let attr = build(AttributeDescriptor::new("tags", Caster::list(Caster::String)));
        let handle = SharedValue::new(vec!["a"]);
        let stored = attr.cast(Some(Value::Shared(handle.clone()))).unwrap().unwrap();
        *handle.write() = Value::from(vec!["b"]);
        assert_eq!(stored.to_json(), json!(["a"]));
    }

    #[test]
    fn test_by_reference_retains_handle() {
        let attr = build(AttributeDescriptor::new("tags", Caster::list(Caster::String)).by_reference());
        let handle = SharedValue::new(vec!["a"]);
        let stored = attr.cast(Some(Value::Shared(handle.clone()))).unwrap().unwrap();
        *handle.write() = Value::from(vec!["b"]);
        assert_eq!(stored.to_json(), json!(["b"]));
    }

    #[test]
    fn test_summary() {
        let attr = build(
            AttributeDescriptor::new("another_value", Caster::Integer)
                .default(0)
                .mutable(true),
        );
        assert_eq!(attr.to_string(), "another_value: integer, default=0, mutable=true");
    }
}
