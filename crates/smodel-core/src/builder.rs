//! # Instance Builder
//!
//! Applies a schema's descriptors to one input map.
//!
//! ## Construction Algorithm
//!
//! 1. Each descriptor, in declaration order, claims its input by canonical
//!    name, then by alias. When both keys are present the canonical one
//!    wins and the alias entry is still consumed.
//! 2. The claimed value (or `None` when absent) goes through
//!    [`AttributeDescriptor::cast`](crate::AttributeDescriptor::cast).
//!    Failures are recorded and the loop continues.
//! 3. Unclaimed keys are kept, discarded, or recorded as errors according
//!    to the model's [`UnknownPolicy`].
//! 4. Any recorded error yields a single [`ConstructionError`]; otherwise
//!    the instance is returned. No partially built instance ever escapes.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::attribute::AttributeDescriptor;
use crate::error::{ConstructionError, FieldError, FieldErrors};
use crate::instance::{Instance, Slot};
use crate::policy::UnknownPolicy;
use crate::schema::ModelSchema;
use crate::value::{InputMap, Value};

pub(crate) fn construct(
    schema: &Arc<ModelSchema>,
    mut input: InputMap,
) -> Result<Instance, ConstructionError> {
    let policy = schema.policy();
    let mut slots = Vec::with_capacity(schema.len());
    let mut errors = Vec::new();

    for descriptor in schema.descriptors() {
        let raw = claim(&mut input, descriptor);
        debug!(
            model = schema.name(),
            attribute = descriptor.name(),
            supplied = raw.is_some(),
            "resolving attribute"
        );

        match descriptor.cast(raw) {
            Ok(value) => slots.push(Slot::new(
                value,
                descriptor.effective_mutability(policy.mutable),
            )),
            Err(e) => {
                warn!(
                    model = schema.name(),
                    attribute = descriptor.name(),
                    value = %e.value,
                    "failed to cast attribute: {}",
                    e.failure
                );
                errors.push(FieldError::Cast(e));
            }
        }
    }

    let extras = match policy.unknown {
        UnknownPolicy::Ignore => {
            if !input.is_empty() {
                trace!(model = schema.name(), count = input.len(), "keeping unknown keys");
            }
            input
        }
        UnknownPolicy::Drop => {
            if !input.is_empty() {
                trace!(model = schema.name(), count = input.len(), "dropping unknown keys");
            }
            InputMap::new()
        }
        UnknownPolicy::Strict => {
            for (key, value) in input {
                warn!(model = schema.name(), key = %key, "unknown key");
                errors.push(FieldError::UnknownField {
                    key,
                    value: value.to_string(),
                });
            }
            InputMap::new()
        }
    };

    if !errors.is_empty() {
        debug!(model = schema.name(), errors = errors.len(), "construction failed");
        return Err(ConstructionError {
            model: schema.name().to_string(),
            errors: FieldErrors::new(errors),
        });
    }

    debug!(model = schema.name(), "constructed instance");
    Ok(Instance::from_parts(Arc::clone(schema), slots, extras))
}

fn claim(input: &mut InputMap, descriptor: &AttributeDescriptor) -> Option<Value> {
    let by_name = input.remove(descriptor.name());
    let by_alias = descriptor.alias().and_then(|alias| input.remove(alias));
    by_name.or(by_alias)
}
