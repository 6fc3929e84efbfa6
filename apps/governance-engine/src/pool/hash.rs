//! Canonical content hashing for pool versioning.
//!
//! Identical inputs must always yield identical hashes, independent of call
//! order or wall-clock time, so the hash covers a canonical serialization of
//! the sorted universe, the filter configuration, and the sorted gating
//! inputs — and never the build timestamp.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::StructuralFilters;
use crate::models::{ConstraintId, HypothesisId, HypothesisScope, PoolBias, Symbol};

/// One hypothesis-driven gating input, in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct GatingInput {
    pub hypothesis_id: HypothesisId,
    pub constraint_id: ConstraintId,
    pub bias: PoolBias,
    pub scope: HypothesisScope,
}

/// Everything the pool hash covers.
#[derive(Debug, Serialize)]
pub(crate) struct PoolHashInputs<'a> {
    pub universe: &'a [Symbol],
    pub filters: &'a StructuralFilters,
    pub gating: &'a [GatingInput],
}

/// Hex SHA-256 of the canonical JSON serialization of the inputs.
pub(crate) fn content_hash(inputs: &PoolHashInputs<'_>) -> String {
    // Struct field order fixes the JSON layout; the caller sorts the
    // universe and gating collections.
    let canonical =
        serde_json::to_vec(inputs).unwrap_or_else(|e| format!("unhashable:{e}").into_bytes());
    let digest = Sha256::digest(&canonical);
    hex::encode(digest)
}

/// Length of the hash prefix embedded in the pool version string.
pub(crate) const VERSION_HASH_PREFIX_LEN: usize = 16;

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs_fixture() -> (Vec<Symbol>, StructuralFilters, Vec<GatingInput>) {
        let universe = vec![Symbol::new("AMD"), Symbol::new("MU")];
        let filters = StructuralFilters::default();
        let gating = vec![GatingInput {
            hypothesis_id: HypothesisId::new("H-1"),
            constraint_id: ConstraintId::new("C-1"),
            bias: PoolBias::Include,
            scope: HypothesisScope {
                symbols: vec![Symbol::new("MU")],
                sectors: vec![],
            },
        }];
        (universe, filters, gating)
    }

    #[test]
    fn identical_inputs_hash_identically() {
        let (universe, filters, gating) = inputs_fixture();
        let a = content_hash(&PoolHashInputs {
            universe: &universe,
            filters: &filters,
            gating: &gating,
        });
        let b = content_hash(&PoolHashInputs {
            universe: &universe,
            filters: &filters,
            gating: &gating,
        });
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn different_gating_changes_the_hash() {
        let (universe, filters, gating) = inputs_fixture();
        let a = content_hash(&PoolHashInputs {
            universe: &universe,
            filters: &filters,
            gating: &gating,
        });
        let b = content_hash(&PoolHashInputs {
            universe: &universe,
            filters: &filters,
            gating: &[],
        });
        assert_ne!(a, b);
    }

    #[test]
    fn filter_config_changes_the_hash() {
        let (universe, filters, gating) = inputs_fixture();
        let mut tighter = filters.clone();
        tighter.min_price = 10.0;
        let a = content_hash(&PoolHashInputs {
            universe: &universe,
            filters: &filters,
            gating: &gating,
        });
        let b = content_hash(&PoolHashInputs {
            universe: &universe,
            filters: &tighter,
            gating: &gating,
        });
        assert_ne!(a, b);
    }
}
