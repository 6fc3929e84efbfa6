//! Governance constraints: risk/timing effects gated by hypothesis status.
//!
//! A constraint never selects what to trade. Its actions are restricted to a
//! closed field set of risk and timing scalars, and its guardrails are hard
//! ceilings that dominate any action value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::identifiers::{ConstraintId, HypothesisId, StrategyId, Symbol};

/// The closed set of action fields a constraint may carry.
///
/// The standalone allowlist validator checks raw configuration documents
/// against this list; the typed [`ConstraintActions`] struct enforces the
/// same set at deserialization time via `deny_unknown_fields`.
pub const ALLOWED_ACTION_FIELDS: [&str; 8] = [
    "enable_strategy",
    "disable_strategy",
    "pool_bias",
    "veto_downgrade",
    "risk_budget_multiplier",
    "holding_extension_days",
    "position_cap_multiplier",
    "stop_mode",
];

/// Stop handling mode requested by a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopMode {
    /// Default stop placement.
    Standard,
    /// Tighter stops than default.
    Tightened,
    /// Trailing stops.
    Trailing,
    /// Stops suspended (position exits managed elsewhere).
    Disabled,
}

/// Effect of a constraint on pool membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolBias {
    /// Re-admit in-scope universe symbols even if structurally filtered.
    Include,
    /// Remove in-scope symbols from the pool.
    Exclude,
    /// Keep membership, record a priority weight for downstream ranking.
    Prioritize {
        /// Relative weight; higher ranks earlier.
        weight: Decimal,
    },
}

/// Actions a constraint applies while active. Closed field set: any other
/// field fails validation at load time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintActions {
    /// Enable a strategy for in-scope symbols.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_strategy: Option<StrategyId>,
    /// Disable a strategy for in-scope symbols.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_strategy: Option<StrategyId>,
    /// Pool membership effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_bias: Option<PoolBias>,
    /// Downgrade hard vetoes to soft warnings for in-scope symbols.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veto_downgrade: Option<bool>,
    /// Multiplier on the symbol's risk budget. Composes multiplicatively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_budget_multiplier: Option<Decimal>,
    /// Extra holding days granted beyond the strategy default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holding_extension_days: Option<u32>,
    /// Multiplier on the symbol's position cap. Composes multiplicatively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_cap_multiplier: Option<Decimal>,
    /// Requested stop handling mode. Highest-priority setter wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_mode: Option<StopMode>,
}

impl ConstraintActions {
    /// Whether no action field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.enable_strategy.is_none()
            && self.disable_strategy.is_none()
            && self.pool_bias.is_none()
            && self.veto_downgrade.is_none()
            && self.risk_budget_multiplier.is_none()
            && self.holding_extension_days.is_none()
            && self.position_cap_multiplier.is_none()
            && self.stop_mode.is_none()
    }
}

/// Hard ceilings that dominate action values regardless of priority.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Guardrails {
    /// Maximum position size as a fraction of equity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_position_pct: Option<Decimal>,
    /// Maximum change in gross exposure attributable to this governance path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_gross_exposure_delta: Option<Decimal>,
    /// Maximum drawdown add-on tolerated before forced review.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_drawdown_addon: Option<Decimal>,
}

impl Guardrails {
    /// Whether no ceiling is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.max_position_pct.is_none()
            && self.max_gross_exposure_delta.is_none()
            && self.max_drawdown_addon.is_none()
    }

    /// Per-field minimum of two guardrail sets. `None` means unbounded.
    #[must_use]
    pub fn min_with(&self, other: &Self) -> Self {
        fn min_opt(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
            match (a, b) {
                (Some(x), Some(y)) => Some(x.min(y)),
                (Some(x), None) | (None, Some(x)) => Some(x),
                (None, None) => None,
            }
        }
        Self {
            max_position_pct: min_opt(self.max_position_pct, other.max_position_pct),
            max_gross_exposure_delta: min_opt(
                self.max_gross_exposure_delta,
                other.max_gross_exposure_delta,
            ),
            max_drawdown_addon: min_opt(self.max_drawdown_addon, other.max_drawdown_addon),
        }
    }
}

/// Activation rule: all listed hypotheses must be ACTIVE.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivationRule {
    /// Hypotheses that must all be ACTIVE for the constraint to apply.
    /// Empty means the constraint is structurally always active.
    #[serde(default)]
    pub hypotheses: Vec<HypothesisId>,
    /// Whether falsification of a backing hypothesis deactivates this
    /// constraint immediately (with audit and alert) rather than leaving the
    /// deactivation for human review.
    #[serde(default)]
    pub disabled_if_falsified: bool,
}

/// Symbol/strategy applicability. Both lists empty means unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Applicability {
    /// Symbols this constraint applies to.
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    /// Strategies this constraint applies to.
    #[serde(default)]
    pub strategies: Vec<StrategyId>,
}

impl Applicability {
    /// Whether the constraint applies to the given symbol.
    ///
    /// An empty symbol list means the constraint is unrestricted by symbol
    /// (it may still be restricted by strategy, which the strategy layer
    /// enforces on its side of the boundary).
    #[must_use]
    pub fn applies_to_symbol(&self, symbol: &Symbol) -> bool {
        self.symbols.is_empty() || self.symbols.contains(symbol)
    }
}

/// A governance constraint: hypothesis-gated risk/timing effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Unique identifier.
    pub id: ConstraintId,
    /// Short human-readable title.
    pub title: String,
    /// Symbol/strategy applicability.
    #[serde(default)]
    pub applicability: Applicability,
    /// Activation rule over hypothesis statuses.
    #[serde(default)]
    pub activation: ActivationRule,
    /// Risk/timing actions (closed field set).
    #[serde(default)]
    pub actions: ConstraintActions,
    /// Hard ceilings, dominant over actions.
    #[serde(default)]
    pub guardrails: Guardrails,
    /// Conflict priority: lower number wins.
    pub priority: u32,
}
