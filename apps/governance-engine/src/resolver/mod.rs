//! Per-symbol constraint resolution with hot-path caching.
//!
//! `resolve` is invoked once per symbol per strategy evaluation cycle. The
//! cache is checked first; only a miss recomputes, synchronously, from the
//! in-memory registry snapshot — never from disk or network. A cache hit
//! requires both TTL freshness and a snapshot-version match, and any
//! registry mutation additionally clears the whole cache: staleness after an
//! intentional disable is a correctness bug, not a performance tradeoff.

mod fold;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;

use crate::audit::AuditLogger;
use crate::models::{AuditEventType, AuditLogEntry, ResolvedConstraints, Symbol, TraceId};
use crate::registry::SharedRegistries;

pub use fold::resolve_from_snapshot;

struct CacheEntry {
    resolved: Arc<ResolvedConstraints>,
    cached_at: Instant,
    snapshot_version: u64,
}

/// Resolves the aggregate constraint effect for symbols, with caching.
pub struct ConstraintResolver {
    registries: Arc<SharedRegistries>,
    audit: Arc<AuditLogger>,
    cache: RwLock<HashMap<Symbol, CacheEntry>>,
    ttl: Duration,
}

impl ConstraintResolver {
    /// Create a resolver over the registries with the given cache TTL.
    #[must_use]
    pub fn new(registries: Arc<SharedRegistries>, audit: Arc<AuditLogger>, ttl: Duration) -> Self {
        Self {
            registries,
            audit,
            cache: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Resolve the aggregate constraint effect for a symbol.
    ///
    /// Never mutates registries; the only side effects are cache population
    /// and audit entries for material effects on a fresh computation.
    #[must_use]
    pub fn resolve(&self, symbol: &Symbol) -> Arc<ResolvedConstraints> {
        self.resolve_traced(symbol, None)
    }

    /// Resolve with an optional trace id linking the audit entries to a
    /// trading decision.
    #[must_use]
    pub fn resolve_traced(
        &self,
        symbol: &Symbol,
        trace: Option<&TraceId>,
    ) -> Arc<ResolvedConstraints> {
        let snapshot = self.registries.snapshot();

        {
            let cache = self.cache.read().unwrap();
            if let Some(entry) = cache.get(symbol)
                && entry.snapshot_version == snapshot.version
                && entry.cached_at.elapsed() < self.ttl
            {
                return entry.resolved.clone();
            }
        }

        let resolved = Arc::new(fold::resolve_from_snapshot(&snapshot, symbol, Utc::now()));
        self.audit_material_effects(&resolved, trace);

        let mut cache = self.cache.write().unwrap();
        cache.insert(
            symbol.clone(),
            CacheEntry {
                resolved: resolved.clone(),
                cached_at: Instant::now(),
                snapshot_version: snapshot.version,
            },
        );
        resolved
    }

    /// Drop every cached resolution.
    ///
    /// Broadcast invalidation: a single configuration or status change
    /// clears the whole cache rather than attempting per-symbol repair.
    pub fn invalidate_all(&self) {
        let mut cache = self.cache.write().unwrap();
        let dropped = cache.len();
        cache.clear();
        tracing::debug!(dropped, "Resolver cache invalidated");
    }

    /// Number of live cache entries (for tests and introspection).
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.read().unwrap().len()
    }

    /// Record audit entries for effects that change trading behavior.
    /// Cache hits do not re-log; one entry per effect per resolution epoch.
    fn audit_material_effects(&self, resolved: &ResolvedConstraints, trace: Option<&TraceId>) {
        if resolved.effects.is_empty() {
            return;
        }
        let contributors: Vec<&str> = resolved
            .effects
            .iter()
            .map(|e| e.constraint_id.as_str())
            .collect();
        let primary = resolved.effects[0].constraint_id.clone();

        if resolved.risk_budget_multiplier != Decimal::ONE {
            self.append_effect(
                AuditEventType::RiskBudgetAdjusted,
                resolved,
                trace,
                json!({
                    "multiplier": resolved.risk_budget_multiplier.to_string(),
                    "constraints": contributors,
                }),
                primary.clone(),
            );
        }
        if resolved.position_cap_multiplier != Decimal::ONE {
            self.append_effect(
                AuditEventType::PositionCapApplied,
                resolved,
                trace,
                json!({
                    "multiplier": resolved.position_cap_multiplier.to_string(),
                    "constraints": contributors,
                }),
                primary.clone(),
            );
        }
        if resolved.veto_downgrade {
            self.append_effect(
                AuditEventType::VetoDowngrade,
                resolved,
                trace,
                json!({ "constraints": contributors }),
                primary,
            );
        }
    }

    fn append_effect(
        &self,
        event: AuditEventType,
        resolved: &ResolvedConstraints,
        trace: Option<&TraceId>,
        details: serde_json::Value,
        constraint_id: crate::models::ConstraintId,
    ) {
        let mut entry = AuditLogEntry::new(resolved.resolved_at, event)
            .with_symbol(resolved.symbol.clone())
            .with_constraint(constraint_id)
            .with_details(details);
        if let Some(trace) = trace {
            entry = entry.with_trace(trace.clone());
        }
        // Resolution proceeds even if the audit store is down; the logger
        // has already escalated the failure.
        let _ = self.audit.append(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ActivationRule, Applicability, AuditQuery, CompareOp, Constraint, ConstraintActions,
        ConstraintId, Falsifier, Guardrails, Hypothesis, HypothesisId, HypothesisScope,
        HypothesisStatus, StopMode, TriggerAction,
    };
    use rust_decimal_macros::dec;

    fn hypothesis(id: &str) -> Hypothesis {
        Hypothesis {
            id: HypothesisId::new(id),
            title: "t".to_string(),
            statement: "s".to_string(),
            scope: HypothesisScope::default(),
            status: HypothesisStatus::Draft,
            review_cadence_days: 7,
            created_at: Utc::now(),
            evidence: vec![],
            falsifiers: vec![Falsifier {
                metric: "m".to_string(),
                op: CompareOp::Lt,
                threshold: 0.0,
                window_days: 30,
                trigger: TriggerAction::Sunset,
                cadence_days: None,
            }],
            constraints: vec![],
        }
    }

    fn constraint(id: &str, priority: u32, hypotheses: &[&str]) -> Constraint {
        Constraint {
            id: ConstraintId::new(id),
            title: "t".to_string(),
            applicability: Applicability::default(),
            activation: ActivationRule {
                hypotheses: hypotheses.iter().map(|h| HypothesisId::new(*h)).collect(),
                disabled_if_falsified: true,
            },
            actions: ConstraintActions {
                risk_budget_multiplier: Some(dec!(1.5)),
                stop_mode: Some(StopMode::Tightened),
                ..Default::default()
            },
            guardrails: Guardrails::default(),
            priority,
        }
    }

    fn setup() -> (Arc<SharedRegistries>, ConstraintResolver) {
        let registries = Arc::new(SharedRegistries::new());
        let audit = Arc::new(AuditLogger::in_memory());
        let resolver =
            ConstraintResolver::new(registries.clone(), audit, Duration::from_secs(60));
        (registries, resolver)
    }

    #[test]
    fn priority_fold_example() {
        let (registries, resolver) = setup();
        registries.register_hypothesis(hypothesis("H-1")).unwrap();
        registries
            .approve_hypothesis(&HypothesisId::new("H-1"))
            .unwrap();

        let mut a = constraint("C-A", 10, &["H-1"]);
        a.actions.risk_budget_multiplier = Some(dec!(1.5));
        let mut b = constraint("C-B", 20, &["H-1"]);
        b.actions.risk_budget_multiplier = Some(dec!(2.0));
        b.actions.stop_mode = Some(StopMode::Trailing);
        registries.register_constraint(a).unwrap();
        registries.register_constraint(b).unwrap();

        let resolved = resolver.resolve(&Symbol::new("MU"));
        assert_eq!(resolved.risk_budget_multiplier, dec!(3.0));
        assert_eq!(resolved.stop_mode, Some(StopMode::Tightened));
    }

    #[test]
    fn cache_hit_returns_same_resolution() {
        let (registries, resolver) = setup();
        registries.register_hypothesis(hypothesis("H-1")).unwrap();
        registries
            .approve_hypothesis(&HypothesisId::new("H-1"))
            .unwrap();
        registries
            .register_constraint(constraint("C-A", 10, &["H-1"]))
            .unwrap();

        let first = resolver.resolve(&Symbol::new("MU"));
        let second = resolver.resolve(&Symbol::new("MU"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.cached_len(), 1);
    }

    #[test]
    fn registry_mutation_makes_cached_entry_unservable() {
        let (registries, resolver) = setup();
        registries.register_hypothesis(hypothesis("H-1")).unwrap();
        registries
            .approve_hypothesis(&HypothesisId::new("H-1"))
            .unwrap();
        registries
            .register_constraint(constraint("C-A", 10, &["H-1"]))
            .unwrap();

        let before = resolver.resolve(&Symbol::new("MU"));
        assert_eq!(before.effects.len(), 1);

        // Falsification path: the hypothesis sunsets. Even without an
        // explicit invalidate call, the version guard rejects the stale
        // entry.
        registries
            .transition_hypothesis(
                &HypothesisId::new("H-1"),
                HypothesisStatus::Sunset,
                crate::models::Actor::Engine,
            )
            .unwrap();

        let after = resolver.resolve(&Symbol::new("MU"));
        assert!(after.is_unrestricted());
    }

    #[test]
    fn invalidate_all_clears_cache() {
        let (registries, resolver) = setup();
        registries
            .register_constraint(constraint("C-ALWAYS", 10, &[]))
            .unwrap();
        let _ = resolver.resolve(&Symbol::new("MU"));
        let _ = resolver.resolve(&Symbol::new("AMD"));
        assert_eq!(resolver.cached_len(), 2);

        resolver.invalidate_all();
        assert_eq!(resolver.cached_len(), 0);
    }

    #[test]
    fn fresh_resolution_audits_risk_budget_with_symbol() {
        let registries = Arc::new(SharedRegistries::new());
        let audit = Arc::new(AuditLogger::in_memory());
        let resolver = ConstraintResolver::new(
            registries.clone(),
            audit.clone(),
            Duration::from_secs(60),
        );

        registries
            .register_constraint(constraint("C-ALWAYS", 10, &[]))
            .unwrap();

        let _ = resolver.resolve(&Symbol::new("MU"));
        let _ = resolver.resolve(&Symbol::new("MU")); // cache hit: no duplicate entry

        let entries = audit
            .query(&AuditQuery {
                symbol: Some(Symbol::new("MU")),
                event: Some(crate::models::AuditEventType::RiskBudgetAdjusted),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].details["multiplier"], "1.5");
    }

    #[test]
    fn unrestricted_symbol_audits_nothing() {
        let registries = Arc::new(SharedRegistries::new());
        let audit = Arc::new(AuditLogger::in_memory());
        let resolver = ConstraintResolver::new(
            registries,
            audit.clone(),
            Duration::from_secs(60),
        );
        let resolved = resolver.resolve(&Symbol::new("MU"));
        assert!(resolved.is_unrestricted());
        assert!(audit.is_empty());
    }

    #[test]
    fn trace_id_flows_into_audit_entries() {
        let registries = Arc::new(SharedRegistries::new());
        let audit = Arc::new(AuditLogger::in_memory());
        let resolver = ConstraintResolver::new(
            registries.clone(),
            audit.clone(),
            Duration::from_secs(60),
        );
        registries
            .register_constraint(constraint("C-ALWAYS", 10, &[]))
            .unwrap();

        let trace = TraceId::new("decision-42");
        let _ = resolver.resolve_traced(&Symbol::new("MU"), Some(&trace));

        let entries = audit.query(&AuditQuery::default()).unwrap();
        assert!(entries.iter().any(|e| e.trace_id.as_ref() == Some(&trace)));
    }
}
