#![deny(missing_docs)]

//! # smodel-schema: Declarative Model Documents
//!
//! Loads model declarations from YAML or JSON documents into a
//! [`SchemaRegistry`] and decodes YAML input into `smodel_core` input maps.
//!
//! ## Documents (`document`)
//!
//! [`SchemaDocument`] is the serde shape of a model file: a `models:` list,
//! each entry naming its attributes, their types, and an optional policy
//! and parent model.
//!
//! ## Registry (`registry`)
//!
//! [`SchemaRegistry`] resolves type names into casters, declares schemas
//! from documents, and constructs instances of registered models. Loading
//! a document is all-or-nothing.
//!
//! ## Crate Policy
//!
//! - Depends only on `smodel-core` internally.
//! - Attribute declaration rules live in `smodel-core`; this crate never
//!   relaxes them.

pub mod document;
pub mod error;
pub mod input;
pub mod registry;

pub use document::{AttributeDocument, ModelDocument, SchemaDocument, TypeSpec};
pub use error::{DecodeError, RegistryError};
pub use input::from_yaml_str;
pub use registry::SchemaRegistry;
