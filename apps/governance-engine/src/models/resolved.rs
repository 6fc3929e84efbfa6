//! Resolved per-symbol constraint effects.
//!
//! This is the only constraint-shaped data that crosses the strategy
//! boundary: pre-resolved scalars, never hypothesis text or raw constraint
//! objects.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::constraint::{ConstraintActions, Guardrails, StopMode};
use super::identifiers::{ConstraintId, StrategyId, Symbol};

/// One constraint's contribution to a resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintEffect {
    /// The contributing constraint.
    pub constraint_id: ConstraintId,
    /// Its priority at resolution time (lower wins conflicts).
    pub priority: u32,
    /// The action fields it applied.
    pub actions: ConstraintActions,
    /// The guardrails it contributed.
    pub guardrails: Guardrails,
}

/// Aggregate risk/timing effect of all active constraints on one symbol.
///
/// Derived cache entry, never hand-authored. Aggregation semantics are the
/// per-field reducer table documented in the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConstraints {
    /// The symbol this resolution is for.
    pub symbol: Symbol,
    /// Contributing effects in priority order.
    pub effects: Vec<ConstraintEffect>,
    /// Product of all risk-budget multipliers (1 when none set).
    pub risk_budget_multiplier: Decimal,
    /// Product of all position-cap multipliers (1 when none set).
    pub position_cap_multiplier: Decimal,
    /// True if any contributing constraint downgrades vetoes.
    pub veto_downgrade: bool,
    /// Stop mode from the highest-priority constraint that set one.
    pub stop_mode: Option<StopMode>,
    /// Maximum holding extension granted, in days.
    pub holding_extension_days: u32,
    /// Strategies enabled by contributing constraints.
    pub enabled_strategies: BTreeSet<StrategyId>,
    /// Strategies disabled by contributing constraints.
    pub disabled_strategies: BTreeSet<StrategyId>,
    /// Most restrictive guardrails across all contributors. Ceilings here
    /// dominate every action value above, regardless of priority.
    pub guardrails: Guardrails,
    /// Registry snapshot version this resolution was computed against.
    pub version: u64,
    /// When the resolution was computed.
    pub resolved_at: DateTime<Utc>,
}

impl ResolvedConstraints {
    /// The neutral resolution for a symbol with no active constraints.
    #[must_use]
    pub fn unrestricted(symbol: Symbol, version: u64, resolved_at: DateTime<Utc>) -> Self {
        Self {
            symbol,
            effects: Vec::new(),
            risk_budget_multiplier: Decimal::ONE,
            position_cap_multiplier: Decimal::ONE,
            veto_downgrade: false,
            stop_mode: None,
            holding_extension_days: 0,
            enabled_strategies: BTreeSet::new(),
            disabled_strategies: BTreeSet::new(),
            guardrails: Guardrails::default(),
            version,
            resolved_at,
        }
    }

    /// Whether any constraint contributed.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.effects.is_empty()
    }
}
