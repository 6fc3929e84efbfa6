//! The deterministic, audited trading pool.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::Symbol;

/// Per-symbol outcome recorded while building a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolDecisionKind {
    /// Symbol admitted (or re-admitted by an inclusion override).
    Included,
    /// Symbol removed.
    Excluded,
    /// Symbol kept and flagged for priority ranking.
    Prioritized,
}

/// One entry in a pool's decision trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolDecision {
    /// The symbol the decision applies to.
    pub symbol: Symbol,
    /// What happened.
    pub kind: PoolDecisionKind,
    /// Why it happened.
    pub reason: String,
    /// The originating filter name, hypothesis id, or constraint id.
    pub source: String,
}

/// The set of symbols eligible for trading in a given epoch.
///
/// Construction guarantees the symbol list is sorted, de-duplicated, and
/// non-empty; the version combines the build timestamp with a content hash
/// over all inputs so identical inputs always share a hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    /// Sorted, de-duplicated member symbols.
    pub symbols: Vec<Symbol>,
    /// `{timestamp}_{content-hash-prefix}` version string.
    pub version: String,
    /// Full hex SHA-256 of the canonical inputs (timestamp excluded).
    pub content_hash: String,
    /// When the pool was built.
    pub built_at: DateTime<Utc>,
    /// Ordered per-symbol decision trail.
    pub decisions: Vec<PoolDecision>,
}

impl Pool {
    /// Number of member symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// A pool is never empty by construction; this exists for the
    /// `len`/`is_empty` pairing convention.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Whether the pool contains a symbol.
    #[must_use]
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.symbols.binary_search(symbol).is_ok()
    }

    /// All decisions recorded for a symbol, in order.
    #[must_use]
    pub fn decisions_for(&self, symbol: &Symbol) -> Vec<&PoolDecision> {
        self.decisions.iter().filter(|d| &d.symbol == symbol).collect()
    }
}
