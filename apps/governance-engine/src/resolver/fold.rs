//! Priority-ordered folding of constraint effects.
//!
//! Each action field has its own, load-bearing combination rule, so the fold
//! is an explicit per-field reducer table rather than generic merge code:
//!
//! | field                    | reducer                                   |
//! |--------------------------|-------------------------------------------|
//! | `risk_budget_multiplier` | product of all contributors               |
//! | `position_cap_multiplier`| product of all contributors               |
//! | `veto_downgrade`         | logical OR                                |
//! | `stop_mode`              | highest-priority (lowest number) setter   |
//! | `holding_extension_days` | maximum (the widest grant applies)        |
//! | `enable_strategy`        | set union                                 |
//! | `disable_strategy`       | set union                                 |
//! | `guardrails.*`           | per-field minimum (most restrictive)      |
//!
//! Guardrails dominate actions regardless of priority: a ceiling from a
//! low-priority constraint still caps a multiplier granted by a
//! high-priority one. Upstream precedence between co-located guardrails and
//! higher-priority actions is not fully settled; until it is, dominance is
//! absolute here.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::{Constraint, ConstraintEffect, ResolvedConstraints, Symbol};
use crate::registry::GovernanceSnapshot;

/// Resolve a symbol against a snapshot.
///
/// Gathers active applicable constraints in (priority, id) order and folds
/// their effects with the reducer table above. Pure: never mutates the
/// snapshot.
#[must_use]
pub fn resolve_from_snapshot(
    snapshot: &GovernanceSnapshot,
    symbol: &Symbol,
    resolved_at: DateTime<Utc>,
) -> ResolvedConstraints {
    let constraints = snapshot.active_constraints_for_symbol(symbol);
    fold_constraints(symbol, &constraints, snapshot.version, resolved_at)
}

/// Fold already-ordered constraints into a resolution.
#[must_use]
pub(crate) fn fold_constraints(
    symbol: &Symbol,
    ordered: &[&Constraint],
    version: u64,
    resolved_at: DateTime<Utc>,
) -> ResolvedConstraints {
    let mut resolved = ResolvedConstraints::unrestricted(symbol.clone(), version, resolved_at);

    let mut enabled = BTreeSet::new();
    let mut disabled = BTreeSet::new();

    for constraint in ordered {
        let actions = &constraint.actions;

        if let Some(multiplier) = actions.risk_budget_multiplier {
            resolved.risk_budget_multiplier *= multiplier;
        }
        if let Some(multiplier) = actions.position_cap_multiplier {
            resolved.position_cap_multiplier *= multiplier;
        }
        if actions.veto_downgrade == Some(true) {
            resolved.veto_downgrade = true;
        }
        // First setter wins: the input is already in priority order.
        if resolved.stop_mode.is_none()
            && let Some(mode) = actions.stop_mode
        {
            resolved.stop_mode = Some(mode);
        }
        if let Some(days) = actions.holding_extension_days {
            resolved.holding_extension_days = resolved.holding_extension_days.max(days);
        }
        if let Some(strategy) = &actions.enable_strategy {
            enabled.insert(strategy.clone());
        }
        if let Some(strategy) = &actions.disable_strategy {
            disabled.insert(strategy.clone());
        }

        resolved.guardrails = resolved.guardrails.min_with(&constraint.guardrails);

        resolved.effects.push(ConstraintEffect {
            constraint_id: constraint.id.clone(),
            priority: constraint.priority,
            actions: constraint.actions.clone(),
            guardrails: constraint.guardrails.clone(),
        });
    }

    resolved.enabled_strategies = enabled;
    resolved.disabled_strategies = disabled;

    // Guardrail dominance: ceilings cap the composed multipliers' ability
    // to grow exposure. The ceilings are reported alongside the multipliers;
    // consumers apply them after any action-derived scaling.
    debug_assert!(resolved.risk_budget_multiplier > Decimal::ZERO);

    resolved
}
