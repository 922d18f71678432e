//! # Model Schemas
//!
//! A [`ModelSchema`] is a named, ordered list of attribute descriptors plus
//! a [`ModelPolicy`]. Schemas are declared mutably, then published behind
//! an `Arc` with [`ModelSchema::shared`]; a published schema is a read-only
//! template that any number of threads may construct from concurrently.
//!
//! ## Declaration Rules
//!
//! - Declaration order is projection order.
//! - Re-declaring a name replaces the prior descriptor in place.
//! - An alias may not collide with another attribute's name or alias.
//!
//! ## Identity
//!
//! A published schema is identified by its `Arc`, not by its name. Two
//! separately declared schemas named `Foo` are different models.

use std::sync::Arc;

use crate::attribute::{AttributeBuilder, AttributeDescriptor};
use crate::builder;
use crate::error::{ConstructionError, DeclarationError, ModelError};
use crate::input;
use crate::instance::Instance;
use crate::policy::ModelPolicy;
use crate::value::InputMap;

/// Named, ordered collection of attribute descriptors.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    name: String,
    attributes: Vec<AttributeDescriptor>,
    policy: ModelPolicy,
    /// Ancestor schemas, nearest first.
    ancestors: Vec<Arc<ModelSchema>>,
}

impl ModelSchema {
    /// Empty schema with the default policy.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            policy: ModelPolicy::default(),
            ancestors: Vec::new(),
        }
    }

    /// Schema inheriting `parent`'s descriptors and policy.
    ///
    /// Instances of the two schemas compare equal when their projections
    /// match.
    pub fn extending(name: impl Into<String>, parent: &Arc<ModelSchema>) -> Self {
        let mut ancestors = Vec::with_capacity(parent.ancestors.len() + 1);
        ancestors.push(Arc::clone(parent));
        ancestors.extend(parent.ancestors.iter().cloned());
        Self {
            name: name.into(),
            attributes: parent.attributes.clone(),
            policy: parent.policy,
            ancestors,
        }
    }

    /// Replace the policy.
    pub fn with_policy(mut self, policy: ModelPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add or replace a descriptor.
    ///
    /// # Errors
    ///
    /// Returns `AliasConflict` if the descriptor's name or alias is already
    /// claimed by a different attribute.
    pub fn declare_attribute(
        &mut self,
        descriptor: AttributeDescriptor,
    ) -> Result<(), DeclarationError> {
        for other in self.attributes.iter().filter(|a| a.name() != descriptor.name()) {
            let collision = descriptor
                .alias()
                .filter(|alias| other.matches(alias))
                .or_else(|| other.alias().filter(|alias| *alias == descriptor.name()));
            if let Some(alias) = collision {
                return Err(DeclarationError::AliasConflict {
                    attribute: descriptor.name().to_string(),
                    alias: alias.to_string(),
                    other: other.name().to_string(),
                });
            }
        }

        match self.attributes.iter().position(|a| a.name() == descriptor.name()) {
            Some(index) => self.attributes[index] = descriptor,
            None => self.attributes.push(descriptor),
        }
        Ok(())
    }

    /// Build and declare in one chaining step.
    ///
    /// # Errors
    ///
    /// Any [`DeclarationError`] from [`AttributeBuilder::build`] or
    /// [`ModelSchema::declare_attribute`].
    pub fn attribute(mut self, builder: AttributeBuilder) -> Result<Self, DeclarationError> {
        self.declare_attribute(builder.build()?)?;
        Ok(self)
    }

    /// Publish the schema as a shareable read-only template.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Model-wide policy.
    pub fn policy(&self) -> &ModelPolicy {
        &self.policy
    }

    /// Descriptors in declaration order.
    pub fn descriptors(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    /// Ancestor schemas, nearest first.
    pub fn ancestors(&self) -> &[Arc<ModelSchema>] {
        &self.ancestors
    }

    /// Ancestor names, nearest first.
    pub fn lineage(&self) -> Vec<&str> {
        self.ancestors.iter().map(|a| a.name()).collect()
    }

    /// Returns true if `other` is this very schema or one of its ancestors.
    pub fn is_same_or_descendant_of(&self, other: &ModelSchema) -> bool {
        std::ptr::eq(self, other)
            || self
                .ancestors
                .iter()
                .any(|a| std::ptr::eq(Arc::as_ptr(a), other))
    }

    /// Number of declared attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns true if no attribute is declared.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Position of the attribute named `key`, or aliased `key`.
    ///
    /// Canonical names are searched before aliases.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|a| a.name() == key)
            .or_else(|| self.attributes.iter().position(|a| a.alias() == Some(key)))
    }

    /// Descriptor named or aliased `key`.
    pub fn descriptor(&self, key: &str) -> Option<&AttributeDescriptor> {
        self.position(key).map(|i| &self.attributes[i])
    }

    /// Returns true if either schema is the other or one of its ancestors.
    ///
    /// Schemas are compared by identity; equal names are not enough.
    pub fn is_compatible(&self, other: &ModelSchema) -> bool {
        self.is_same_or_descendant_of(other) || other.is_same_or_descendant_of(self)
    }

    /// Construct a validated instance from named inputs.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstructionError`] listing every field-level failure.
    pub fn construct(self: &Arc<Self>, input: InputMap) -> Result<Instance, ConstructionError> {
        builder::construct(self, input)
    }

    /// Construct from a decoded JSON object.
    ///
    /// # Errors
    ///
    /// `ModelError::Input` if `input` is not an object, otherwise
    /// `ModelError::Construction`.
    pub fn construct_json(self: &Arc<Self>, input: &serde_json::Value) -> Result<Instance, ModelError> {
        let input = input::from_json_value(input)?;
        Ok(self.construct(input)?)
    }
}
