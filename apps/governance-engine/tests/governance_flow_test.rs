//! End-to-end governance flow tests.
//!
//! Loads the YAML fixtures, approves hypotheses, builds pools, resolves
//! constraints, runs falsifier cycles, and checks the audit trail — the
//! full lifecycle a trading session exercises.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use governance_engine::alert::AlertSink;
use governance_engine::audit::AuditLogger;
use governance_engine::config::load_config_dir;
use governance_engine::engine::GovernanceEngine;
use governance_engine::models::{
    Alert, AlertSeverity, AuditEventType, AuditQuery, HypothesisId, HypothesisStatus,
    PoolDecisionKind, RegimeObservation, RegimeState, StopMode, Symbol,
};
use governance_engine::monitor::StaticMetricProvider;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path
}

/// Collects dispatched alerts for assertions.
#[derive(Debug, Default)]
struct CapturingSink {
    alerts: Mutex<Vec<Alert>>,
}

impl CapturingSink {
    fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

impl AlertSink for CapturingSink {
    fn dispatch(&self, alert: &Alert) {
        self.alerts.lock().unwrap().push(alert.clone());
    }
}

fn engine_with_sink() -> (GovernanceEngine, Arc<CapturingSink>) {
    let config = load_config_dir(fixtures_dir()).expect("fixtures should load");
    let sink = Arc::new(CapturingSink::default());
    let engine = GovernanceEngine::with_components(
        config,
        Arc::new(AuditLogger::in_memory()),
        sink.clone(),
    )
    .expect("engine should build");
    (engine, sink)
}

#[test]
fn fixtures_load_and_validate() {
    let config = load_config_dir(fixtures_dir()).unwrap();
    assert_eq!(config.hypotheses.len(), 2);
    assert_eq!(config.constraints.len(), 3);
    assert_eq!(config.factors.len(), 2);
    assert_eq!(config.universe.len(), 5);
    // Everything loads as DRAFT; activation is a human action.
    assert!(config
        .hypotheses
        .iter()
        .all(|h| h.status == HypothesisStatus::Draft));
}

#[test]
fn pool_is_deterministic_and_audited() {
    let (engine, _sink) = engine_with_sink();

    let first = engine.build_pool().unwrap();
    let second = engine.build_pool().unwrap();
    assert_eq!(first.symbols, second.symbols);
    assert_eq!(first.content_hash, second.content_hash);

    // THIN fails the volume floor and its exclusion is in the trail.
    assert!(!first.contains(&Symbol::new("THIN")));
    let thin = first.decisions_for(&Symbol::new("THIN"));
    assert_eq!(thin[0].kind, PoolDecisionKind::Excluded);
    assert_eq!(thin[0].source, "volume_floor");

    // Liquid names made it.
    for symbol in ["MU", "AMD", "NVDA", "JPM"] {
        assert!(first.contains(&Symbol::new(symbol)), "{symbol} missing");
    }
}

#[test]
fn draft_hypotheses_have_no_effect() {
    let (engine, _sink) = engine_with_sink();
    let resolved = engine.resolve(&Symbol::new("MU"));
    assert!(resolved.is_unrestricted());
}

#[test]
fn approval_activates_constraints_and_composes_effects() {
    let (engine, _sink) = engine_with_sink();
    engine
        .approve_hypothesis(&HypothesisId::new("H-MEM-UPCYCLE"))
        .unwrap();
    engine
        .approve_hypothesis(&HypothesisId::new("H-AI-CAPEX"))
        .unwrap();

    let resolved = engine.resolve(&Symbol::new("MU"));
    // 1.5 (C-MEM-OVERWEIGHT) * 2.0 (C-AI-PRIORITY) compose multiplicatively.
    assert_eq!(resolved.risk_budget_multiplier, dec!(3.0));
    // Priority 10 wins the stop mode conflict over priority 20.
    assert_eq!(resolved.stop_mode, Some(StopMode::Tightened));
    assert_eq!(resolved.holding_extension_days, 10);
    assert_eq!(resolved.guardrails.max_position_pct, Some(dec!(0.08)));

    // AMD is only in scope of the sector-wide constraint.
    let amd = engine.resolve(&Symbol::new("AMD"));
    assert_eq!(amd.risk_budget_multiplier, dec!(2.0));
    assert_eq!(amd.stop_mode, Some(StopMode::Trailing));

    // Prioritized decisions land in the pool trail for in-scope members.
    let pool = engine.build_pool().unwrap();
    assert!(pool
        .decisions_for(&Symbol::new("NVDA"))
        .iter()
        .any(|d| d.kind == PoolDecisionKind::Prioritized && d.source == "C-AI-PRIORITY"));
}

#[test]
fn risk_adjustment_is_discoverable_in_one_query() {
    let (engine, _sink) = engine_with_sink();
    engine
        .approve_hypothesis(&HypothesisId::new("H-MEM-UPCYCLE"))
        .unwrap();
    engine
        .approve_hypothesis(&HypothesisId::new("H-AI-CAPEX"))
        .unwrap();

    let day_start = Utc::now() - Duration::hours(1);
    let _ = engine.resolve(&Symbol::new("MU"));

    let entries = engine
        .audit()
        .query(&AuditQuery {
            symbol: Some(Symbol::new("MU")),
            time_range: Some((day_start, day_start + Duration::days(1))),
            event: Some(AuditEventType::RiskBudgetAdjusted),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(entries.len(), 1);

    let multiplier =
        Decimal::from_str(entries[0].details["multiplier"].as_str().unwrap()).unwrap();
    assert_eq!(multiplier, dec!(3.0));
    let contributors = entries[0].details["constraints"].as_array().unwrap();
    assert!(contributors
        .iter()
        .any(|c| c.as_str() == Some("C-MEM-OVERWEIGHT")));
}

#[tokio::test]
async fn falsification_cascades_end_to_end() {
    let (engine, sink) = engine_with_sink();
    engine
        .approve_hypothesis(&HypothesisId::new("H-MEM-UPCYCLE"))
        .unwrap();
    engine
        .approve_hypothesis(&HypothesisId::new("H-AI-CAPEX"))
        .unwrap();

    // Warm resolutions while everything is active.
    assert_eq!(
        engine.resolve(&Symbol::new("MU")).risk_budget_multiplier,
        dec!(3.0)
    );

    // DRAM spot trend breaks down; the other metrics stay healthy.
    engine
        .metrics()
        .register("dram_spot_trend_30d", Arc::new(StaticMetricProvider::new(-0.1)));
    engine
        .metrics()
        .register("hbm_capacity_utilization", Arc::new(StaticMetricProvider::new(0.92)));
    engine
        .metrics()
        .register("hyperscaler_capex_growth", Arc::new(StaticMetricProvider::new(0.18)));

    let monitor = engine.monitor();
    let summary = monitor.run_cycle(Utc::now()).await;
    assert_eq!(summary.triggered, 1);
    assert_eq!(summary.failures, 0);

    // The hypothesis sunset and its constraints no longer resolve.
    let hypothesis = engine
        .registries()
        .get_hypothesis(&HypothesisId::new("H-MEM-UPCYCLE"))
        .unwrap();
    assert_eq!(hypothesis.status, HypothesisStatus::Sunset);

    let resolved = engine.resolve(&Symbol::new("MU"));
    assert_eq!(resolved.risk_budget_multiplier, dec!(2.0));
    assert_eq!(resolved.stop_mode, Some(StopMode::Trailing));

    // Audit trail: trigger recorded, cascade recorded per opted-in constraint.
    let triggered = engine
        .audit()
        .query(&AuditQuery {
            event: Some(AuditEventType::FalsifierTriggered),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].details["value"], -0.1);

    let deactivated = engine
        .audit()
        .query(&AuditQuery {
            event: Some(AuditEventType::ConstraintDeactivated),
            ..Default::default()
        })
        .unwrap();
    let ids: Vec<&str> = deactivated
        .iter()
        .filter_map(|e| e.constraint_id.as_ref().map(|c| c.as_str()))
        .collect();
    assert!(ids.contains(&"C-MEM-OVERWEIGHT"));
    assert!(ids.contains(&"C-MEM-POOL"));

    // A critical alert went out.
    assert!(sink
        .alerts()
        .iter()
        .any(|a| a.severity == AlertSeverity::Critical));

    // Healthy falsifiers recorded passes.
    let passes = engine
        .audit()
        .query(&AuditQuery {
            event: Some(AuditEventType::FalsifierPass),
            ..Default::default()
        })
        .unwrap();
    assert!(!passes.is_empty());
}

#[tokio::test]
async fn unavailable_metric_never_falsifies() {
    let (engine, sink) = engine_with_sink();
    engine
        .approve_hypothesis(&HypothesisId::new("H-MEM-UPCYCLE"))
        .unwrap();
    // No providers registered at all: every check skips.

    let monitor = engine.monitor();
    let summary = monitor.run_cycle(Utc::now()).await;
    assert_eq!(summary.triggered, 0);
    assert_eq!(summary.skipped, 2);

    let hypothesis = engine
        .registries()
        .get_hypothesis(&HypothesisId::new("H-MEM-UPCYCLE"))
        .unwrap();
    assert_eq!(hypothesis.status, HypothesisStatus::Active);
    assert!(sink
        .alerts()
        .iter()
        .all(|a| a.severity != AlertSeverity::Critical));
}

#[test]
fn empty_pool_is_fatal_and_alerted() {
    let mut config = load_config_dir(fixtures_dir()).unwrap();
    config.filters.min_avg_daily_volume = f64::MAX;
    let sink = Arc::new(CapturingSink::default());
    let engine = GovernanceEngine::with_components(
        config,
        Arc::new(AuditLogger::in_memory()),
        sink.clone(),
    )
    .unwrap();

    let err = engine.build_pool().unwrap_err();
    assert_eq!(err.universe_size, 5);
    assert!(sink
        .alerts()
        .iter()
        .any(|a| a.severity == AlertSeverity::Critical));
}

#[test]
fn regime_flows_through_the_strategy_boundary() {
    let (engine, _sink) = engine_with_sink();
    let regime = engine.observe_regime(RegimeObservation {
        volatility: 0.45,
        drawdown: 0.03,
        dispersion: 0.20,
    });
    assert_eq!(regime.state, RegimeState::Stress);
    assert_eq!(
        engine.current_regime().map(|r| r.state),
        Some(RegimeState::Stress)
    );

    let changes = engine
        .audit()
        .query(&AuditQuery {
            event: Some(AuditEventType::RegimeChanged),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(changes.len(), 1);
}
