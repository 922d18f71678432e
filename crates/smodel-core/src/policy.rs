//! # Model Policy
//!
//! Shape-level settings of a [`ModelSchema`](crate::ModelSchema). The
//! policy is plain `serde` data so it can be declared in YAML or JSON
//! next to the attribute list; every field has a default.

use serde::{Deserialize, Serialize};

/// What construction does with input keys no attribute claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownPolicy {
    /// Accept silently and keep them as instance extras (never projected).
    #[default]
    Ignore,
    /// Accept silently and discard them.
    Drop,
    /// Reject each one with an `UnknownField` entry.
    Strict,
}

/// Shape-level policy of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelPolicy {
    /// Elide unset attributes from projections.
    pub hide_unset: bool,
    /// Handling of unclaimed input keys.
    pub unknown: UnknownPolicy,
    /// Mutability of attributes that do not override it.
    pub mutable: bool,
}

impl Default for ModelPolicy {
    fn default() -> Self {
        Self {
            hide_unset: false,
            unknown: UnknownPolicy::Ignore,
            mutable: false,
        }
    }
}

impl ModelPolicy {
    /// Omit unset attributes from projections.
    pub fn hide_unset(mut self, hide_unset: bool) -> Self {
        self.hide_unset = hide_unset;
        self
    }

    /// Set the treatment of unknown input keys.
    pub fn unknown(mut self, unknown: UnknownPolicy) -> Self {
        self.unknown = unknown;
        self
    }

    /// Set the mutability of attributes that do not override it.
    pub fn mutable(mut self, mutable: bool) -> Self {
        self.mutable = mutable;
        self
    }
}
