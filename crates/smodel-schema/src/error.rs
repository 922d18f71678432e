//! # Registry Errors
//!
//! Errors raised while loading declarative model documents into a
//! [`SchemaRegistry`](crate::SchemaRegistry) or decoding YAML input.

use smodel_core::{ConstructionError, DeclarationError, InputError};
use thiserror::Error;

/// Error while building or querying a model registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A model with this name is already registered.
    #[error("model `{name}` is already registered")]
    DuplicateModel {
        /// The model name.
        name: String,
    },

    /// A caster with this name is already registered, or shadows a built-in type.
    #[error("caster `{name}` is already registered")]
    DuplicateCaster {
        /// The caster name.
        name: String,
    },

    /// An attribute refers to a type name nothing provides.
    #[error("attribute `{attribute}` of model `{model}` has unknown type `{type_name}`")]
    UnknownType {
        /// Model being declared.
        model: String,
        /// Attribute carrying the type.
        attribute: String,
        /// The unresolved type name.
        type_name: String,
    },

    /// `extends` names a model that is not registered.
    #[error("model `{model}` extends unknown model `{parent}`")]
    UnknownParent {
        /// Model being declared.
        model: String,
        /// The unresolved parent name.
        parent: String,
    },

    /// A lookup or construction named a model that is not registered.
    #[error("unknown model `{name}`")]
    UnknownModel {
        /// The requested name.
        name: String,
    },

    /// An attribute declaration was rejected.
    #[error("invalid declaration in model `{model}`: {source}")]
    Declaration {
        /// Model being declared.
        model: String,
        /// The underlying declaration error.
        #[source]
        source: DeclarationError,
    },

    /// A document file could not be read or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoad {
        /// Path to the document.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// YAML document text is malformed or has the wrong shape.
    #[error("invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON document text is malformed or has the wrong shape.
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error while scanning a directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Constructing an instance of a registered model failed.
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// Raw input could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Error decoding a YAML input document into an input map.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The text is not valid YAML.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document cannot be represented as an input map.
    #[error(transparent)]
    Input(#[from] InputError),
}
