//! Deterministic pool construction.
//!
//! The builder combines the base universe, the structural filters, and
//! hypothesis-driven gating into a sorted, de-duplicated, versioned pool
//! with a per-symbol decision trail. Identical inputs always yield
//! byte-identical symbol lists and identical content hashes; the version
//! string prepends a build timestamp that the hash deliberately excludes.
//!
//! An empty result is a fatal construction error, never a valid pool.

mod filters;
mod hash;

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use thiserror::Error;

use crate::config::{StructuralFilters, UniverseEntry};
use crate::models::{Pool, PoolBias, PoolDecision, PoolDecisionKind, Symbol};
use crate::registry::GovernanceSnapshot;

pub use filters::FILTER_ORDER;

/// Pool construction excluded every symbol. Fatal: callers must block
/// strategy execution rather than substitute a fallback pool.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "pool construction left no symbols: {universe_size} universe symbols, {excluded} excluded"
)]
pub struct EmptyPoolError {
    /// Base universe size.
    pub universe_size: usize,
    /// Number of exclusion decisions recorded.
    pub excluded: usize,
}

/// Builds deterministic pools from the universe, filters, and the current
/// registry snapshot.
pub struct PoolBuilder {
    universe: Vec<UniverseEntry>,
    filters: StructuralFilters,
}

impl PoolBuilder {
    /// Create a builder over a base universe and filter configuration.
    ///
    /// The universe is sorted by symbol up front so every downstream step
    /// iterates in a deterministic order.
    #[must_use]
    pub fn new(mut universe: Vec<UniverseEntry>, filters: StructuralFilters) -> Self {
        universe.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        universe.dedup_by(|a, b| a.symbol == b.symbol);
        Self { universe, filters }
    }

    /// The configured base universe, sorted by symbol.
    #[must_use]
    pub fn universe(&self) -> &[UniverseEntry] {
        &self.universe
    }

    /// Build a pool against a registry snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyPoolError`] when the surviving symbol set is empty.
    pub fn build(&self, snapshot: &GovernanceSnapshot) -> Result<Pool, EmptyPoolError> {
        let mut decisions: Vec<PoolDecision> = Vec::new();

        // 1. Base universe, sorted (done at construction).
        let entries: Vec<&UniverseEntry> = self.universe.iter().collect();
        let by_symbol: BTreeMap<&Symbol, &UniverseEntry> =
            entries.iter().map(|e| (&e.symbol, *e)).collect();

        // 2. Structural filters in fixed order, exclusions recorded.
        let survivors = filters::apply_structural_filters(&entries, &self.filters, &mut decisions);
        let mut members: BTreeSet<Symbol> = BTreeSet::new();
        for entry in &survivors {
            decisions.push(PoolDecision {
                symbol: entry.symbol.clone(),
                kind: PoolDecisionKind::Included,
                reason: "passed structural filters".to_string(),
                source: "structural_filters".to_string(),
            });
            members.insert(entry.symbol.clone());
        }

        // 3. Hypothesis-driven gating, hypotheses in id order, their linked
        //    constraints in id order.
        let mut gating: Vec<hash::GatingInput> = Vec::new();
        for hypothesis in snapshot.active_hypotheses() {
            let mut linked = hypothesis.constraints.clone();
            linked.sort();
            linked.dedup();
            for constraint_id in &linked {
                let Some(constraint) = snapshot.constraints.get(constraint_id) else {
                    tracing::warn!(
                        hypothesis_id = %hypothesis.id,
                        constraint_id = %constraint_id,
                        "Linked constraint missing from registry; skipping gate"
                    );
                    continue;
                };
                if !snapshot.constraint_is_active(constraint) {
                    continue;
                }
                let Some(bias) = &constraint.actions.pool_bias else {
                    continue;
                };

                gating.push(hash::GatingInput {
                    hypothesis_id: hypothesis.id.clone(),
                    constraint_id: constraint.id.clone(),
                    bias: bias.clone(),
                    scope: hypothesis.scope.clone(),
                });

                for (symbol, entry) in &by_symbol {
                    if !hypothesis.scope.covers(symbol, &entry.sector) {
                        continue;
                    }
                    if !constraint.applicability.applies_to_symbol(symbol) {
                        continue;
                    }
                    match bias {
                        PoolBias::Include => {
                            if members.insert((*symbol).clone()) {
                                decisions.push(PoolDecision {
                                    symbol: (*symbol).clone(),
                                    kind: PoolDecisionKind::Included,
                                    reason: format!(
                                        "inclusion override by hypothesis {}",
                                        hypothesis.id
                                    ),
                                    source: constraint.id.to_string(),
                                });
                            }
                        }
                        PoolBias::Exclude => {
                            if members.remove(*symbol) {
                                decisions.push(PoolDecision {
                                    symbol: (*symbol).clone(),
                                    kind: PoolDecisionKind::Excluded,
                                    reason: format!(
                                        "exclusion override by hypothesis {}",
                                        hypothesis.id
                                    ),
                                    source: constraint.id.to_string(),
                                });
                            }
                        }
                        PoolBias::Prioritize { weight } => {
                            if members.contains(*symbol) {
                                decisions.push(PoolDecision {
                                    symbol: (*symbol).clone(),
                                    kind: PoolDecisionKind::Prioritized,
                                    reason: format!(
                                        "priority bias {weight} by hypothesis {}",
                                        hypothesis.id
                                    ),
                                    source: constraint.id.to_string(),
                                });
                            }
                        }
                    }
                }
            }
        }

        // 4. Fatal on empty; version stamp otherwise.
        let symbols: Vec<Symbol> = members.into_iter().collect();
        if symbols.is_empty() {
            let excluded = decisions
                .iter()
                .filter(|d| d.kind == PoolDecisionKind::Excluded)
                .count();
            return Err(EmptyPoolError {
                universe_size: self.universe.len(),
                excluded,
            });
        }

        let universe_symbols: Vec<Symbol> =
            self.universe.iter().map(|e| e.symbol.clone()).collect();
        let content_hash = hash::content_hash(&hash::PoolHashInputs {
            universe: &universe_symbols,
            filters: &self.filters,
            gating: &gating,
        });
        let built_at = Utc::now();
        let version = format!(
            "{}_{}",
            built_at.format("%Y%m%dT%H%M%SZ"),
            &content_hash[..hash::VERSION_HASH_PREFIX_LEN]
        );

        tracing::info!(
            version = %version,
            members = symbols.len(),
            decisions = decisions.len(),
            "Pool built"
        );

        Ok(Pool {
            symbols,
            version,
            content_hash,
            built_at,
            decisions,
        })
    }
}
