//! # Error Types: Structured Error Hierarchy
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Declaration errors are raised when a descriptor is declared, never
//!   deferred to instantiation.
//! - Field-level failures ([`CastError`], unknown keys) are never surfaced
//!   one at a time from construction. They are collected into
//!   [`FieldErrors`] and returned as a single [`ConstructionError`].
//! - Offending values are carried as strings so an error never holds a live
//!   reference into caller data.

use std::fmt;

use thiserror::Error;

/// Top-level error type for callers mixing declaration, construction,
/// mutation and input decoding.
#[derive(Error, Debug, Clone)]
pub enum ModelError {
    /// A descriptor or schema declaration was structurally invalid.
    #[error("declaration error: {0}")]
    Declaration(#[from] DeclarationError),

    /// Construction of an instance failed.
    #[error("{0}")]
    Construction(#[from] ConstructionError),

    /// A post-construction mutation was rejected.
    #[error("mutation error: {0}")]
    Mutation(#[from] MutationError),

    /// A field lookup matched neither a canonical name nor an alias.
    #[error("{0}")]
    Lookup(#[from] LookupError),

    /// Raw input could not be decoded into an input map.
    #[error("input error: {0}")]
    Input(#[from] InputError),
}

/// Error raised while declaring an attribute or a schema.
#[derive(Error, Debug, Clone)]
pub enum DeclarationError {
    /// Attribute names must be non-empty.
    #[error("attribute name must not be empty")]
    EmptyName,

    /// The attribute builder never received a caster.
    #[error("attribute `{attribute}` has no target type")]
    MissingCaster {
        /// Name of the offending attribute.
        attribute: String,
    },

    /// `default` and `default_factory` are mutually exclusive.
    #[error("attribute `{attribute}` declares both a default and a default factory")]
    ConflictingDefaults {
        /// Name of the offending attribute.
        attribute: String,
    },

    /// The declared default does not survive its own caster.
    #[error("default of attribute `{attribute}` is invalid: {failure}")]
    InvalidDefault {
        /// Name of the offending attribute.
        attribute: String,
        /// Why the default was rejected.
        failure: CastFailure,
    },

    /// An alias collides with another attribute's name or alias.
    #[error("alias `{alias}` of attribute `{attribute}` collides with attribute `{other}`")]
    AliasConflict {
        /// Attribute being declared.
        attribute: String,
        /// The colliding key.
        alias: String,
        /// The attribute already owning that key.
        other: String,
    },
}

/// Why a single value could not be cast.
#[derive(Error, Debug, Clone)]
pub enum CastFailure {
    /// No value was supplied and the attribute is neither optional nor defaulted.
    #[error("attribute value must not be missing")]
    Missing,

    /// An explicit null was supplied to a non-nullable attribute without default.
    #[error("attribute value must not be null")]
    Null,

    /// The value has a shape the caster cannot convert.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// Description of what the caster accepts.
        expected: String,
        /// Runtime type of the supplied value.
        found: &'static str,
    },

    /// The value has the right shape but an invalid content.
    #[error("{0}")]
    Invalid(String),

    /// Construction of a nested model failed.
    #[error("nested {0}")]
    Nested(Box<ConstructionError>),

    /// One or more sequence elements failed.
    #[error("{}", describe_elements(.0))]
    Elements(Vec<ElementFailure>),
}

/// Failure of one element of a sequence cast.
#[derive(Debug, Clone)]
pub struct ElementFailure {
    /// Position of the element in the input sequence.
    pub index: usize,
    /// Why the element was rejected.
    pub failure: CastFailure,
}

fn describe_elements(failures: &[ElementFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("element [{}]: {}", f.index, f.failure))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Per-attribute cast failure with full context.
#[derive(Error, Debug, Clone)]
#[error("attribute `{attribute}` ({descriptor}) rejected value {value}: {failure}")]
pub struct CastError {
    /// Canonical name of the attribute.
    pub attribute: String,
    /// Summary of the attribute descriptor.
    pub descriptor: String,
    /// The offending raw value, stringified.
    pub value: String,
    /// The underlying failure.
    pub failure: CastFailure,
}

/// One entry of an aggregate construction error.
#[derive(Error, Debug, Clone)]
pub enum FieldError {
    /// A declared attribute could not be resolved.
    #[error(transparent)]
    Cast(CastError),

    /// An input key matched no attribute name or alias under the strict policy.
    #[error("unknown key `{key}` with value {value}")]
    UnknownField {
        /// The unclaimed input key.
        key: String,
        /// Its value, stringified.
        value: String,
    },
}

impl FieldError {
    /// The attribute this entry refers to, or `None` for unknown keys.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Cast(e) => Some(&e.attribute),
            Self::UnknownField { .. } => None,
        }
    }

    /// The offending value, stringified.
    pub fn value(&self) -> &str {
        match self {
            Self::Cast(e) => &e.value,
            Self::UnknownField { value, .. } => value,
        }
    }

    /// Human-readable description of the failure.
    pub fn description(&self) -> String {
        match self {
            Self::Cast(e) => e.failure.to_string(),
            Self::UnknownField { key, .. } => format!("unknown key `{key}`"),
        }
    }
}

/// Ordered collection of field errors from one construction attempt.
#[derive(Debug, Clone, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub(crate) fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns a slice of all entries, in discovery order.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Iterate over the entries.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.errors.iter()
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<FieldError> {
        self.errors
    }
}

impl<'a> IntoIterator for &'a FieldErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {e}")?;
        }
        Ok(())
    }
}

/// The single error surfaced from a failed construction.
#[derive(Error, Debug, Clone)]
#[error("construction of model `{model}` failed with {} error(s):\n{errors}", .errors.len())]
pub struct ConstructionError {
    /// Name of the model being constructed.
    pub model: String,
    /// Every field-level failure, in declaration order followed by unknown keys.
    pub errors: FieldErrors,
}

/// Neither a canonical name nor an alias matched the requested key.
#[derive(Error, Debug, Clone)]
#[error("model `{model}` has no attribute `{key}`")]
pub struct LookupError {
    /// Name of the model searched.
    pub model: String,
    /// The requested key.
    pub key: String,
}

/// A mutation targeted an attribute whose effective mutability is false.
#[derive(Error, Debug, Clone)]
#[error("can't set attribute `{attribute}`, model `{model}` declares it immutable")]
pub struct ImmutableFieldError {
    /// Name of the model.
    pub model: String,
    /// Canonical name of the attribute.
    pub attribute: String,
}

/// Error from a post-construction `set` or `reset`.
#[derive(Error, Debug, Clone)]
pub enum MutationError {
    /// The key matched no attribute.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The attribute is immutable.
    #[error(transparent)]
    Immutable(#[from] ImmutableFieldError),

    /// The new value failed casting; the prior value is kept.
    #[error(transparent)]
    Cast(#[from] CastError),
}

/// Error decoding raw documents into an input map.
#[derive(Error, Debug, Clone)]
pub enum InputError {
    /// The document is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(String),

    /// The document root is not a mapping.
    #[error("expected a mapping at the document root, found {found}")]
    NotAMapping {
        /// Runtime type of the root value.
        found: &'static str,
    },

    /// The document uses a construct with no `Value` equivalent.
    #[error("unsupported input: {0}")]
    Unsupported(String),
}

impl From<serde_json::Error> for InputError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cast_error(attribute: &str) -> FieldError {
        FieldError::Cast(CastError {
            attribute: attribute.to_string(),
            descriptor: format!("{attribute}: string"),
            value: "<missing>".to_string(),
            failure: CastFailure::Missing,
        })
    }

    #[test]
    fn test_field_error_accessors() {
        let e = cast_error("name");
        assert_eq!(e.field(), Some("name"));
        assert_eq!(e.value(), "<missing>");
        assert_eq!(e.description(), "attribute value must not be missing");

        let unknown = FieldError::UnknownField {
            key: "extra".to_string(),
            value: "true".to_string(),
        };
        assert_eq!(unknown.field(), None);
        assert_eq!(unknown.value(), "true");
        assert!(unknown.description().contains("extra"));
    }

    #[test]
    fn test_construction_error_display_lists_every_entry() {
        let err = ConstructionError {
            model: "Data".to_string(),
            errors: FieldErrors::new(vec![cast_error("a"), cast_error("b")]),
        };
        let display = err.to_string();
        assert!(display.contains("2 error(s)"));
        assert!(display.contains("attribute `a`"));
        assert!(display.contains("attribute `b`"));
        assert_eq!(display.lines().count(), 3);
    }

    #[test]
    fn test_element_failures_are_indexed() {
        let failure = CastFailure::Elements(vec![
            ElementFailure {
                index: 1,
                failure: CastFailure::Invalid("bad".to_string()),
            },
            ElementFailure {
                index: 3,
                failure: CastFailure::Null,
            },
        ]);
        let display = failure.to_string();
        assert!(display.contains("element [1]: bad"));
        assert!(display.contains("element [3]"));
    }

    #[test]
    fn test_model_error_from_lookup() {
        let err: ModelError = LookupError {
            model: "Data".to_string(),
            key: "nope".to_string(),
        }
        .into();
        assert!(matches!(err, ModelError::Lookup(_)));
        assert!(err.to_string().contains("nope"));
    }
}
