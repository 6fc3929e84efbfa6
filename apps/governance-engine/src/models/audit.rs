//! Audit log entries: the immutable record of every governance effect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::{ConstraintId, HypothesisId, StrategyId, Symbol, TraceId};

/// Closed set of auditable governance events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    /// A constraint's activation rule became satisfied.
    ConstraintActivated,
    /// A constraint's activation rule stopped being satisfied.
    ConstraintDeactivated,
    /// A falsifier check passed.
    FalsifierPass,
    /// A falsifier check triggered.
    FalsifierTriggered,
    /// A veto was downgraded for a symbol.
    VetoDowngrade,
    /// A risk budget multiplier was applied to a symbol.
    RiskBudgetAdjusted,
    /// A position cap multiplier was applied to a symbol.
    PositionCapApplied,
    /// A pool was built.
    PoolBuilt,
    /// The market regime classification changed.
    RegimeChanged,
}

/// An immutable audit record. Append-only: no updates or deletes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub event: AuditEventType,
    /// Hypothesis involved, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypothesis_id: Option<HypothesisId>,
    /// Constraint involved, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_id: Option<ConstraintId>,
    /// Symbol affected, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
    /// Strategy affected, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_id: Option<StrategyId>,
    /// Structured action details.
    pub details: serde_json::Value,
    /// Trace id linking to a trading decision, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<TraceId>,
}

impl AuditLogEntry {
    /// Create an entry for an event at a given time with empty details.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, event: AuditEventType) -> Self {
        Self {
            timestamp,
            event,
            hypothesis_id: None,
            constraint_id: None,
            symbol: None,
            strategy_id: None,
            details: serde_json::Value::Null,
            trace_id: None,
        }
    }

    /// Attach a hypothesis id.
    #[must_use]
    pub fn with_hypothesis(mut self, id: HypothesisId) -> Self {
        self.hypothesis_id = Some(id);
        self
    }

    /// Attach a constraint id.
    #[must_use]
    pub fn with_constraint(mut self, id: ConstraintId) -> Self {
        self.constraint_id = Some(id);
        self
    }

    /// Attach a symbol.
    #[must_use]
    pub fn with_symbol(mut self, symbol: Symbol) -> Self {
        self.symbol = Some(symbol);
        self
    }

    /// Attach a strategy id.
    #[must_use]
    pub fn with_strategy(mut self, id: StrategyId) -> Self {
        self.strategy_id = Some(id);
        self
    }

    /// Attach structured details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Attach a trace id.
    #[must_use]
    pub fn with_trace(mut self, trace: TraceId) -> Self {
        self.trace_id = Some(trace);
        self
    }
}

/// Filters for audit queries. All fields are conjunctive; `None` matches
/// everything.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Match entries for this symbol.
    pub symbol: Option<Symbol>,
    /// Match entries in `[start, end)`.
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// Match entries for this constraint.
    pub constraint_id: Option<ConstraintId>,
    /// Match entries of this event type.
    pub event: Option<AuditEventType>,
}

impl AuditQuery {
    /// Whether an entry satisfies every set filter.
    #[must_use]
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if let Some(symbol) = &self.symbol
            && entry.symbol.as_ref() != Some(symbol)
        {
            return false;
        }
        if let Some((start, end)) = &self.time_range
            && (entry.timestamp < *start || entry.timestamp >= *end)
        {
            return false;
        }
        if let Some(constraint_id) = &self.constraint_id
            && entry.constraint_id.as_ref() != Some(constraint_id)
        {
            return false;
        }
        if let Some(event) = &self.event
            && entry.event != *event
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(event: AuditEventType, symbol: &str) -> AuditLogEntry {
        AuditLogEntry::new(Utc::now(), event)
            .with_symbol(Symbol::new(symbol))
            .with_details(json!({"multiplier": "1.5"}))
    }

    #[test]
    fn query_matches_symbol_and_event() {
        let e = entry(AuditEventType::RiskBudgetAdjusted, "MU");
        let query = AuditQuery {
            symbol: Some(Symbol::new("MU")),
            event: Some(AuditEventType::RiskBudgetAdjusted),
            ..Default::default()
        };
        assert!(query.matches(&e));

        let wrong_symbol = AuditQuery {
            symbol: Some(Symbol::new("AMD")),
            ..Default::default()
        };
        assert!(!wrong_symbol.matches(&e));
    }

    #[test]
    fn query_time_range_is_half_open() {
        let e = entry(AuditEventType::PoolBuilt, "MU");
        let query = AuditQuery {
            time_range: Some((e.timestamp, e.timestamp)),
            ..Default::default()
        };
        assert!(!query.matches(&e));

        let query = AuditQuery {
            time_range: Some((e.timestamp, e.timestamp + chrono::Duration::seconds(1))),
            ..Default::default()
        };
        assert!(query.matches(&e));
    }

    #[test]
    fn empty_query_matches_everything() {
        let e = entry(AuditEventType::VetoDowngrade, "MU");
        assert!(AuditQuery::default().matches(&e));
    }
}
