//! Market hypotheses and their falsifier rules.
//!
//! A hypothesis is a human-authored market belief. Its free-text statement
//! and evidence are opaque to the engine: they gate *when* linked constraints
//! apply, never *what* the strategy trades.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::{ConstraintId, HypothesisId, Symbol};

/// Lifecycle status of a hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HypothesisStatus {
    /// Authored but not yet approved for governance effect.
    Draft,
    /// Approved by a human; linked constraints may activate.
    Active,
    /// Retired after falsification or scheduled wind-down. Terminal.
    Sunset,
    /// Rejected by human review. Terminal.
    Rejected,
}

impl HypothesisStatus {
    /// Whether this status permits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Sunset | Self::Rejected)
    }

    /// Whether a transition to `to` is permitted for the given actor.
    ///
    /// Activation is a human decision: the engine can sunset or reject a
    /// hypothesis (falsifier trigger) but can never activate one.
    #[must_use]
    pub const fn transition_allowed(self, to: Self, actor: Actor) -> bool {
        match (self, to) {
            (Self::Draft, Self::Active) => matches!(actor, Actor::Human),
            (Self::Draft, Self::Rejected)
            | (Self::Active, Self::Sunset | Self::Rejected) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for HypothesisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Draft => "DRAFT",
            Self::Active => "ACTIVE",
            Self::Sunset => "SUNSET",
            Self::Rejected => "REJECTED",
        };
        write!(f, "{name}")
    }
}

/// Who is performing a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actor {
    /// An explicit human action (dashboard, CLI, review).
    Human,
    /// The engine itself (falsifier monitor).
    Engine,
}

/// Comparison operator for falsifier and failure-rule thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// Strictly less than.
    #[serde(rename = "<")]
    Lt,
    /// Less than or equal.
    #[serde(rename = "<=")]
    Le,
    /// Strictly greater than.
    #[serde(rename = ">")]
    Gt,
    /// Greater than or equal.
    #[serde(rename = ">=")]
    Ge,
    /// Equal (exact floating-point comparison; use with integer-valued metrics).
    #[serde(rename = "==")]
    Eq,
}

impl CompareOp {
    /// Evaluate `value <op> threshold`.
    #[must_use]
    pub fn compare(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Lt => value < threshold,
            Self::Le => value <= threshold,
            Self::Gt => value > threshold,
            Self::Ge => value >= threshold,
            Self::Eq => value == threshold,
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
        };
        write!(f, "{op}")
    }
}

/// What a triggered falsifier does to its hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerAction {
    /// Flag the hypothesis for human review; status is unchanged.
    Review,
    /// Transition the hypothesis to SUNSET.
    Sunset,
}

/// A quantitative rule that, if met, casts doubt on its hypothesis.
///
/// Pure value object owned by a [`Hypothesis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Falsifier {
    /// Metric name, resolved through the metric registry.
    pub metric: String,
    /// Comparison operator applied as `value <op> threshold`.
    pub op: CompareOp,
    /// Numeric threshold.
    pub threshold: f64,
    /// Evaluation window in days.
    pub window_days: u32,
    /// Action when the rule triggers.
    pub trigger: TriggerAction,
    /// Optional evaluation cadence override in days.
    #[serde(default)]
    pub cadence_days: Option<u32>,
}

/// Symbol and/or sector scope of a hypothesis. Both lists empty means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HypothesisScope {
    /// Symbols this hypothesis speaks about.
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    /// Sectors this hypothesis speaks about.
    #[serde(default)]
    pub sectors: Vec<String>,
}

impl HypothesisScope {
    /// Whether the scope is unrestricted.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.symbols.is_empty() && self.sectors.is_empty()
    }

    /// Whether a symbol (with its universe sector) falls inside this scope.
    #[must_use]
    pub fn covers(&self, symbol: &Symbol, sector: &str) -> bool {
        if self.is_all() {
            return true;
        }
        self.symbols.contains(symbol) || self.sectors.iter().any(|s| s == sector)
    }
}

/// A human-authored market belief with falsifier rules attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Unique, immutable identifier.
    pub id: HypothesisId,
    /// Short human-readable title.
    pub title: String,
    /// Free-text statement of the belief. Opaque: never parsed for decisions.
    pub statement: String,
    /// Symbol/sector scope.
    #[serde(default)]
    pub scope: HypothesisScope,
    /// Lifecycle status.
    pub status: HypothesisStatus,
    /// Review cadence in days.
    pub review_cadence_days: u32,
    /// Creation date.
    pub created_at: DateTime<Utc>,
    /// Supporting evidence references. Opaque free text.
    #[serde(default)]
    pub evidence: Vec<String>,
    /// Ordered falsifier rules. Non-empty for any hypothesis that may reach
    /// ACTIVE status.
    pub falsifiers: Vec<Falsifier>,
    /// Constraints linked to this hypothesis.
    #[serde(default)]
    pub constraints: Vec<ConstraintId>,
}
