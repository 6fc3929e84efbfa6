//! Versioned registry snapshots with atomic publish.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::models::{Constraint, ConstraintId, Factor, FactorId, Hypothesis, HypothesisId};

use super::RegistryError;

/// One immutable view of all registered entities.
///
/// The `version` increases monotonically with every published mutation; the
/// resolver cache keys its entries on it so a stale resolution can never be
/// served after a registry change.
#[derive(Debug, Clone, Default)]
pub struct GovernanceSnapshot {
    /// Hypotheses by id.
    pub hypotheses: BTreeMap<HypothesisId, Hypothesis>,
    /// Constraints by id.
    pub constraints: BTreeMap<ConstraintId, Constraint>,
    /// Factors by name.
    pub factors: BTreeMap<FactorId, Factor>,
    /// Monotonic snapshot version.
    pub version: u64,
}

/// Shared handle over the current snapshot.
///
/// The write lock is held only while swapping the `Arc`; readers take the
/// read lock just long enough to clone it.
#[derive(Debug, Default)]
pub struct SharedRegistries {
    current: RwLock<Arc<GovernanceSnapshot>>,
}

impl SharedRegistries {
    /// Create an empty registry set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot. Cheap: clones an `Arc`.
    #[must_use]
    pub fn snapshot(&self) -> Arc<GovernanceSnapshot> {
        self.current.read().unwrap().clone()
    }

    /// Rebuild the snapshot through `mutate` and publish it atomically.
    ///
    /// The mutation runs against a deep copy; on error nothing is published.
    pub(crate) fn publish<T>(
        &self,
        mutate: impl FnOnce(&mut GovernanceSnapshot) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let mut guard = self.current.write().unwrap();
        let mut next = GovernanceSnapshot::clone(&guard);
        let out = mutate(&mut next)?;
        next.version = guard.version + 1;
        *guard = Arc::new(next);
        Ok(out)
    }
}
