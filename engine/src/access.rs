//! Capability checks.
//!
//! The engine never hard-codes an owner. It asks an injected
//! [`CapabilityChecker`] whether a caller holds a [`Capability`].
//! [`RoleRegistry`] is the in-memory implementation used by tests and the CLI.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{Address, Capability};

/// Answers "may this caller perform actions gated by this capability".
pub trait CapabilityChecker {
    fn has_capability(&self, caller: &Address, capability: Capability) -> bool;
}

/// Explicit role grants per address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleRegistry {
    grants: HashMap<Address, HashSet<Capability>>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style grant.
    pub fn with_grant(mut self, holder: Address, capability: Capability) -> Self {
        self.grant(holder, capability);
        self
    }

    /// Grants `capability` to `holder`. Returns `false` if already held.
    pub fn grant(&mut self, holder: Address, capability: Capability) -> bool {
        self.grants.entry(holder).or_default().insert(capability)
    }

    /// Revokes `capability` from `holder`. Returns `false` if it was not held.
    pub fn revoke(&mut self, holder: &Address, capability: Capability) -> bool {
        match self.grants.get_mut(holder) {
            Some(set) => {
                let removed = set.remove(&capability);
                if set.is_empty() {
                    self.grants.remove(holder);
                }
                removed
            }
            None => false,
        }
    }

    /// Every capability `holder` currently has.
    pub fn capabilities_of(&self, holder: &Address) -> Vec<Capability> {
        self.grants
            .get(holder)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl CapabilityChecker for RoleRegistry {
    fn has_capability(&self, caller: &Address, capability: Capability) -> bool {
        self.grants
            .get(caller)
            .is_some_and(|set| set.contains(&capability))
    }
}
