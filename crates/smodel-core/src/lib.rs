#![deny(missing_docs)]

//! # smodel-core: Declarative Models with Aggregate Validation
//!
//! This crate is the engine of `simple-model`. A caller declares a
//! [`ModelSchema`] (an ordered list of [`AttributeDescriptor`]s plus a
//! [`ModelPolicy`]) and constructs validated [`Instance`]s from loosely
//! typed input such as decoded JSON or YAML.
//!
//! ## Key Design Principles
//!
//! 1. **Casters are a closed tagged variant.** [`Caster`] distinguishes
//!    primitive conversions, nested models, sequences and user functions by
//!    explicit tag inspection. Nothing is dispatched by trial and error.
//!
//! 2. **Construction is all-or-nothing.** Every attribute is resolved even
//!    after a failure; the caller receives one [`ConstructionError`] listing
//!    every invalid field, or a fully populated instance. Never half of one.
//!
//! 3. **Instances are independent.** Schemas are immutable templates behind
//!    `Arc`. Each instance owns its value slots, and input values are deep
//!    copied unless an attribute opts into `by_reference` sharing through
//!    [`SharedValue`].
//!
//! 4. **Projection is the only plain view.** Stored values stay live
//!    (nested [`Instance`]s remain instances); [`Instance::project`] flattens
//!    them into an ordered `serde_json::Value` for equality and re-encoding.
//!
//! ## Example
//!
//! ```
//! use smodel_core::{AttributeDescriptor, Caster, ModelSchema};
//! use serde_json::json;
//!
//! let data = ModelSchema::new("Data")
//!     .attribute(AttributeDescriptor::new("name", Caster::String))?
//!     .attribute(AttributeDescriptor::new("some_value", Caster::String).optional())?
//!     .attribute(AttributeDescriptor::new("another_value", Caster::Integer).default(0))?
//!     .shared();
//!
//! let instance = data.construct_json(&json!({"name": "test"}))?;
//! assert_eq!(
//!     instance.project(),
//!     json!({"name": "test", "some_value": null, "another_value": 0})
//! );
//! # Ok::<(), smodel_core::ModelError>(())
//! ```
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - The crate never installs a `tracing` subscriber; it only emits events.

pub mod attribute;
mod builder;
pub mod caster;
pub mod error;
pub mod input;
pub mod instance;
pub mod policy;
pub mod schema;
pub mod temporal;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use attribute::{AttributeBuilder, AttributeDescriptor, DefaultFactory};
pub use caster::{CastFn, Caster};
pub use error::{
    CastError, CastFailure, ConstructionError, DeclarationError, ElementFailure, FieldError,
    FieldErrors, ImmutableFieldError, InputError, LookupError, ModelError, MutationError,
};
pub use instance::Instance;
pub use policy::{ModelPolicy, UnknownPolicy};
pub use schema::ModelSchema;
pub use value::{InputMap, SharedValue, Value};
