//! # Casters: Uniform Conversion of Raw Values
//!
//! A [`Caster`] is the target type of an attribute. It is a closed tagged
//! variant, so primitive conversion, nested model construction and
//! sequence casting are selected by inspecting the tag rather than by
//! attempting one conversion and falling back on failure.
//!
//! ## Algorithm
//!
//! [`Caster::cast`] applies, in order:
//!
//! 1. A `Shared` handle whose content already has the target type is kept
//!    as-is (this is how `by_reference` attributes retain the caller's
//!    object). Otherwise its snapshot is cast.
//! 2. A value whose runtime type already is the target type is accepted
//!    unchanged. For models this keeps the identity of live instances.
//! 3. Otherwise the tag-specific conversion runs: primitive coercion,
//!    nested construction from a mapping, per-element sequence casting,
//!    or the user function.

use std::fmt;
use std::sync::Arc;

use crate::error::{CastFailure, ElementFailure};
use crate::schema::ModelSchema;
use crate::temporal;
use crate::value::Value;

type CastFnInner = dyn Fn(Value) -> Result<Value, String> + Send + Sync;

/// A named user conversion function.
#[derive(Clone)]
pub struct CastFn {
    name: String,
    func: Arc<CastFnInner>,
}

impl CastFn {
    /// Wrap a conversion function under a descriptive name.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// The descriptive name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, value: Value) -> Result<Value, CastFailure> {
        (self.func)(value).map_err(CastFailure::Invalid)
    }
}

impl fmt::Debug for CastFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CastFn").field("name", &self.name).finish()
    }
}

/// Target type of an attribute.
#[derive(Debug, Clone)]
pub enum Caster {
    /// Strings; integers, floats and booleans are stringified.
    String,
    /// 64-bit integers; numeric strings are parsed, finite floats truncated.
    Integer,
    /// 64-bit floats; integers widen, numeric strings are parsed.
    Float,
    /// Booleans; `0`/`1` and common spellings (`true`, `no`, `on`, ...) are accepted.
    Boolean,
    /// Any value, accepted unchanged.
    Any,
    /// A user conversion function.
    Function(CastFn),
    /// A nested model, constructed from a mapping.
    Model(Arc<ModelSchema>),
    /// A sequence whose elements are cast with the inner caster.
    List(Box<Caster>),
}

impl Caster {
    /// Sequence of `inner`.
    pub fn list(inner: Caster) -> Self {
        Self::List(Box::new(inner))
    }

    /// Nested model.
    pub fn model(schema: &Arc<ModelSchema>) -> Self {
        Self::Model(Arc::clone(schema))
    }

    /// User conversion function.
    pub fn function<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self::Function(CastFn::new(name, func))
    }

    /// Accepts only values equal to one of `allowed`.
    pub fn one_of<I, V>(allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let allowed: Vec<Value> = allowed.into_iter().map(Into::into).collect();
        let listing = allowed
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let name = format!("one_of[{listing}]");
        Self::function(name, move |value| {
            if allowed.contains(&value) {
                Ok(value)
            } else {
                Err(format!("must be one of [{listing}] but was {value}"))
            }
        })
    }

    /// Calendar date parsed with a `chrono` format, normalized to `YYYY-MM-DD`.
    pub fn date(format: impl Into<String>) -> Self {
        let format = format.into();
        Self::function(format!("date({format})"), move |value| match value {
            Value::Str(s) => temporal::normalize_date(&s, &format).map(Value::Str),
            other => Err(format!("expected a date string, found {}", other.type_name())),
        })
    }

    /// RFC 3339 timestamp normalized to UTC with `Z` suffix.
    pub fn datetime() -> Self {
        Self::function("datetime", |value| match value {
            Value::Str(s) => temporal::normalize_datetime(&s).map(Value::Str),
            other => Err(format!(
                "expected a timestamp string, found {}",
                other.type_name()
            )),
        })
    }

    /// Returns true if `value` already has exactly this target type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Any, _) => true,
            (Self::String, Value::Str(_))
            | (Self::Integer, Value::Int(_))
            | (Self::Float, Value::Float(_))
            | (Self::Boolean, Value::Bool(_)) => true,
            (Self::Model(schema), Value::Model(instance)) => {
                Arc::ptr_eq(instance.schema(), schema)
            }
            (Self::List(inner), Value::List(items)) => items.iter().all(|v| inner.accepts(v)),
            _ => false,
        }
    }

    /// Convert `value` into this target type.
    pub fn cast(&self, value: Value) -> Result<Value, CastFailure> {
        if let Value::Shared(handle) = &value {
            let snapshot = handle.snapshot();
            if self.accepts(&snapshot) {
                return Ok(value);
            }
            return self.cast(snapshot);
        }
        if self.accepts(&value) {
            return Ok(value);
        }

        match self {
            Self::String => cast_string(value),
            Self::Integer => cast_integer(value),
            Self::Float => cast_float(value),
            Self::Boolean => cast_boolean(value),
            Self::Any => Ok(value),
            Self::Function(func) => func.call(value),
            Self::Model(schema) => match value {
                Value::Map(entries) => schema
                    .construct(entries)
                    .map(Value::Model)
                    .map_err(|e| CastFailure::Nested(Box::new(e))),
                // An instance of another model is re-read through its projection keys.
                Value::Model(other) => schema
                    .construct(other.to_input_map())
                    .map(Value::Model)
                    .map_err(|e| CastFailure::Nested(Box::new(e))),
                other => Err(self.mismatch(&other)),
            },
            Self::List(inner) => match value {
                Value::List(items) => cast_elements(inner, items),
                other => Err(self.mismatch(&other)),
            },
        }
    }

    fn mismatch(&self, value: &Value) -> CastFailure {
        let expected = match self {
            Self::Model(schema) => format!("a mapping for model `{}`", schema.name()),
            other => other.to_string(),
        };
        CastFailure::TypeMismatch {
            expected,
            found: value.type_name(),
        }
    }
}

impl fmt::Display for Caster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "boolean"),
            Self::Any => write!(f, "any"),
            Self::Function(func) => write!(f, "{}", func.name()),
            Self::Model(schema) => write!(f, "{}", schema.name()),
            Self::List(inner) => write!(f, "list<{inner}>"),
        }
    }
}

fn cast_elements(inner: &Caster, items: Vec<Value>) -> Result<Value, CastFailure> {
    let mut cast = Vec::with_capacity(items.len());
    let mut failures = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        match inner.cast(item) {
            Ok(value) => cast.push(value),
            Err(failure) => failures.push(ElementFailure { index, failure }),
        }
    }
    if failures.is_empty() {
        Ok(Value::List(cast))
    } else {
        Err(CastFailure::Elements(failures))
    }
}

fn cast_string(value: Value) -> Result<Value, CastFailure> {
    match value {
        Value::Int(n) => Ok(Value::Str(n.to_string())),
        Value::Float(n) => Ok(Value::Str(n.to_string())),
        Value::Bool(b) => Ok(Value::Str(b.to_string())),
        other => Err(Caster::String.mismatch(&other)),
    }
}

const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn cast_integer(value: Value) -> Result<Value, CastFailure> {
    match value {
        Value::Float(n) => {
            let truncated = n.trunc();
            // i64::MAX is not representable as f64; 2^63 is the first value out of range.
            if n.is_finite() && truncated >= -I64_BOUND && truncated < I64_BOUND {
                Ok(Value::Int(truncated as i64))
            } else {
                Err(CastFailure::Invalid(format!(
                    "float {n} cannot be represented as an integer"
                )))
            }
        }
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| CastFailure::Invalid(format!("invalid integer literal {s:?}"))),
        other => Err(Caster::Integer.mismatch(&other)),
    }
}

fn cast_float(value: Value) -> Result<Value, CastFailure> {
    match value {
        Value::Int(n) => Ok(Value::Float(n as f64)),
        Value::Bool(b) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| CastFailure::Invalid(format!("invalid float literal {s:?}"))),
        other => Err(Caster::Float.mismatch(&other)),
    }
}

fn cast_boolean(value: Value) -> Result<Value, CastFailure> {
    match value {
        Value::Int(0) => Ok(Value::Bool(false)),
        Value::Int(1) => Ok(Value::Bool(true)),
        Value::Int(n) => Err(CastFailure::Invalid(format!(
            "integer {n} is not a boolean (expected 0 or 1)"
        ))),
        Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(CastFailure::Invalid(format!("invalid boolean literal {s:?}"))),
        },
        other => Err(Caster::Boolean.mismatch(&other)),
    }
}
