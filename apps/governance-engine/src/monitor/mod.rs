//! Falsifier monitor.
//!
//! A periodically-scheduled task that evaluates every ACTIVE hypothesis's
//! falsifiers against live metrics and drives status transitions, cascading
//! constraint deactivation, alerting, and audit. It shares no lock with the
//! hot-path resolver: it communicates only by publishing new registry
//! snapshots and broadcasting cache invalidation.
//!
//! # Architecture
//!
//! ```text
//! FalsifierMonitor
//!     │
//!     ├── tick loop ──► due falsifiers per ACTIVE hypothesis
//!     │        │
//!     │        ▼
//!     ├── MetricRegistry::provider_for(metric) ──► get_value()
//!     │        │
//!     │        ▼
//!     └── trigger ──► Alert + Audit + SUNSET + cascade + cache invalidation
//! ```

mod metrics;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::broadcast;

use crate::alert::AlertSink;
use crate::audit::{AuditError, AuditLogger};
use crate::config::EngineSettings;
use crate::models::{
    Actor, Alert, AlertSeverity, AuditEventType, AuditLogEntry, Falsifier, Hypothesis,
    HypothesisId, HypothesisStatus, TriggerAction,
};
use crate::registry::{RegistryError, SharedRegistries};
use crate::resolver::ConstraintResolver;

pub use metrics::{MetricError, MetricProvider, MetricRegistry, StaticMetricProvider};

/// Per-hypothesis check state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    /// No falsifier was due yet.
    NotYetDue,
    /// A check cycle is evaluating this hypothesis.
    Checking,
    /// The last due check triggered a falsifier.
    Triggered,
    /// The last due check passed every falsifier.
    Passed,
}

/// Per-hypothesis evaluation failures, isolated per cycle.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// A registry mutation failed mid-evaluation.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The audit store rejected the check record.
    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Summary of one monitor cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Hypotheses with at least one due falsifier evaluated.
    pub evaluated: usize,
    /// Falsifiers that triggered.
    pub triggered: usize,
    /// Falsifiers that passed.
    pub passed: usize,
    /// Checks skipped because the metric was unavailable.
    pub skipped: usize,
    /// Hypotheses whose evaluation failed (isolated, cycle continued).
    pub failures: usize,
}

/// The falsifier monitor.
pub struct FalsifierMonitor {
    registries: Arc<SharedRegistries>,
    metrics: Arc<MetricRegistry>,
    audit: Arc<AuditLogger>,
    resolver: Arc<ConstraintResolver>,
    alerts: Arc<dyn AlertSink>,
    settings: EngineSettings,
    states: Mutex<HashMap<HypothesisId, CheckState>>,
    last_checked: Mutex<HashMap<(HypothesisId, String), DateTime<Utc>>>,
}

impl FalsifierMonitor {
    /// Create a monitor over the shared engine components.
    #[must_use]
    pub fn new(
        registries: Arc<SharedRegistries>,
        metrics: Arc<MetricRegistry>,
        audit: Arc<AuditLogger>,
        resolver: Arc<ConstraintResolver>,
        alerts: Arc<dyn AlertSink>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            registries,
            metrics,
            audit,
            resolver,
            alerts,
            settings,
            states: Mutex::new(HashMap::new()),
            last_checked: Mutex::new(HashMap::new()),
        }
    }

    /// Run the monitor loop until shutdown.
    pub async fn run(self: Arc<Self>, mut shutdown_rx: broadcast::Receiver<()>) {
        if !self.settings.monitor_enabled {
            tracing::info!("Falsifier monitor disabled, skipping");
            return;
        }

        let tick = Duration::from_secs(self.settings.monitor_tick_secs);
        let mut interval = tokio::time::interval(tick);

        tracing::info!(
            tick_secs = self.settings.monitor_tick_secs,
            default_cadence_days = self.settings.monitor_default_cadence_days,
            "Falsifier monitor started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let summary = self.run_cycle(Utc::now()).await;
                    if summary.evaluated > 0 {
                        tracing::info!(
                            evaluated = summary.evaluated,
                            triggered = summary.triggered,
                            passed = summary.passed,
                            skipped = summary.skipped,
                            failures = summary.failures,
                            "Falsifier cycle complete"
                        );
                    }
                }

                _ = shutdown_rx.recv() => {
                    tracing::info!("Falsifier monitor shutting down");
                    break;
                }
            }
        }
    }

    /// Evaluate every ACTIVE hypothesis with due falsifiers once.
    ///
    /// A failure evaluating one hypothesis never aborts the others.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleSummary {
        let snapshot = self.registries.snapshot();
        let active_ids: Vec<HypothesisId> = snapshot
            .active_hypotheses()
            .iter()
            .map(|h| h.id.clone())
            .collect();

        let mut summary = CycleSummary::default();
        for id in active_ids {
            // Re-read per hypothesis: an earlier sunset in this cycle may
            // have changed the snapshot.
            let current = self.registries.snapshot();
            let Some(hypothesis) = current.hypotheses.get(&id).cloned() else {
                continue;
            };
            if hypothesis.status != HypothesisStatus::Active {
                continue;
            }

            match self.evaluate_hypothesis(&hypothesis, now, &mut summary).await {
                Ok(()) => {}
                Err(e) => {
                    summary.failures += 1;
                    tracing::error!(
                        hypothesis_id = %id,
                        error = %e,
                        "Falsifier evaluation failed; continuing with remaining hypotheses"
                    );
                }
            }
        }
        summary
    }

    /// Current check state of a hypothesis.
    #[must_use]
    pub fn check_state(&self, id: &HypothesisId) -> CheckState {
        self.states
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(CheckState::NotYetDue)
    }

    async fn evaluate_hypothesis(
        &self,
        hypothesis: &Hypothesis,
        now: DateTime<Utc>,
        summary: &mut CycleSummary,
    ) -> Result<(), MonitorError> {
        let due: Vec<(usize, &Falsifier)> = hypothesis
            .falsifiers
            .iter()
            .enumerate()
            .filter(|(_, f)| self.is_due(&hypothesis.id, f, now))
            .collect();
        if due.is_empty() {
            return Ok(());
        }

        self.set_state(&hypothesis.id, CheckState::Checking);
        summary.evaluated += 1;
        let mut any_triggered = false;

        for (idx, falsifier) in due {
            let Some(provider) = self.metrics.provider_for(&falsifier.metric) else {
                self.skip_unavailable(
                    hypothesis,
                    falsifier,
                    "no provider registered for metric",
                );
                summary.skipped += 1;
                continue;
            };

            let value = match provider
                .get_value(&falsifier.metric, &hypothesis.scope, falsifier.window_days)
                .await
            {
                Ok(value) => value,
                Err(e) => {
                    self.skip_unavailable(hypothesis, falsifier, &e.to_string());
                    summary.skipped += 1;
                    continue;
                }
            };

            self.mark_checked(&hypothesis.id, &falsifier.metric, now);

            if falsifier.op.compare(value, falsifier.threshold) {
                summary.triggered += 1;
                any_triggered = true;
                self.handle_trigger(hypothesis, idx, falsifier, value, now)?;
            } else {
                summary.passed += 1;
                self.audit.append(
                    AuditLogEntry::new(now, AuditEventType::FalsifierPass)
                        .with_hypothesis(hypothesis.id.clone())
                        .with_details(json!({
                            "metric": falsifier.metric,
                            "value": value,
                            "op": falsifier.op.to_string(),
                            "threshold": falsifier.threshold,
                            "window_days": falsifier.window_days,
                        })),
                )?;
            }
        }

        self.set_state(
            &hypothesis.id,
            if any_triggered {
                CheckState::Triggered
            } else {
                CheckState::Passed
            },
        );
        Ok(())
    }

    fn handle_trigger(
        &self,
        hypothesis: &Hypothesis,
        falsifier_index: usize,
        falsifier: &Falsifier,
        value: f64,
        now: DateTime<Utc>,
    ) -> Result<(), MonitorError> {
        tracing::warn!(
            hypothesis_id = %hypothesis.id,
            metric = %falsifier.metric,
            value,
            threshold = falsifier.threshold,
            trigger = ?falsifier.trigger,
            "Falsifier triggered"
        );

        self.audit.append(
            AuditLogEntry::new(now, AuditEventType::FalsifierTriggered)
                .with_hypothesis(hypothesis.id.clone())
                .with_details(json!({
                    "falsifier_index": falsifier_index,
                    "metric": falsifier.metric,
                    "value": value,
                    "op": falsifier.op.to_string(),
                    "threshold": falsifier.threshold,
                    "window_days": falsifier.window_days,
                    "trigger": falsifier.trigger,
                })),
        )?;

        let (severity, recommended) = match falsifier.trigger {
            TriggerAction::Review => (
                AlertSeverity::Warning,
                format!("review hypothesis {}", hypothesis.id),
            ),
            TriggerAction::Sunset => (
                AlertSeverity::Critical,
                format!(
                    "hypothesis {} sunset; verify dependent constraints are inactive",
                    hypothesis.id
                ),
            ),
        };
        self.alerts.dispatch(
            &Alert::new(
                severity,
                format!("Falsifier triggered: {}", falsifier.metric),
                format!(
                    "{} {} {} over {}d window (observed {value})",
                    falsifier.metric, falsifier.op, falsifier.threshold, falsifier.window_days
                ),
            )
            .with_hypothesis(hypothesis.id.clone())
            .with_recommended_action(recommended),
        );

        if falsifier.trigger == TriggerAction::Sunset {
            // A second triggering falsifier in the same cycle finds the
            // hypothesis already sunset; the transition happens once.
            let still_active = self
                .registries
                .snapshot()
                .hypotheses
                .get(&hypothesis.id)
                .is_some_and(|h| h.status == HypothesisStatus::Active);
            if !still_active {
                return Ok(());
            }
            self.registries.transition_hypothesis(
                &hypothesis.id,
                HypothesisStatus::Sunset,
                Actor::Engine,
            )?;

            // Cascade: constraints that opted into auto-disable are now
            // inactive (their activation rule no longer holds); announce
            // each one. Constraints that did not opt in also deactivate,
            // but silently, pending human review.
            let snapshot = self.registries.snapshot();
            for constraint_id in &hypothesis.constraints {
                let Some(constraint) = snapshot.constraints.get(constraint_id) else {
                    continue;
                };
                if constraint.activation.disabled_if_falsified {
                    self.audit.append(
                        AuditLogEntry::new(now, AuditEventType::ConstraintDeactivated)
                            .with_hypothesis(hypothesis.id.clone())
                            .with_constraint(constraint_id.clone())
                            .with_details(json!({
                                "cause": "falsifier_sunset",
                                "metric": falsifier.metric,
                            })),
                    )?;
                }
            }

            // Activation changed: drop every cached resolution immediately
            // rather than waiting out the TTL.
            self.resolver.invalidate_all();
        }

        Ok(())
    }

    fn skip_unavailable(&self, hypothesis: &Hypothesis, falsifier: &Falsifier, reason: &str) {
        tracing::warn!(
            hypothesis_id = %hypothesis.id,
            metric = %falsifier.metric,
            reason,
            "Metric unavailable; skipping falsifier check"
        );
        self.alerts.dispatch(
            &Alert::new(
                AlertSeverity::Warning,
                format!("Metric unavailable: {}", falsifier.metric),
                format!(
                    "falsifier check for {} skipped: {reason}",
                    hypothesis.id
                ),
            )
            .with_hypothesis(hypothesis.id.clone())
            .with_recommended_action("restore the metric provider"),
        );
    }

    fn is_due(&self, id: &HypothesisId, falsifier: &Falsifier, now: DateTime<Utc>) -> bool {
        let cadence_days = falsifier
            .cadence_days
            .unwrap_or(self.settings.monitor_default_cadence_days);
        let key = (id.clone(), falsifier.metric.clone());
        let last_checked = self.last_checked.lock().unwrap();
        match last_checked.get(&key) {
            Some(last) => now - *last >= chrono::Duration::days(i64::from(cadence_days)),
            None => true,
        }
    }

    fn mark_checked(&self, id: &HypothesisId, metric: &str, now: DateTime<Utc>) {
        let mut last_checked = self.last_checked.lock().unwrap();
        last_checked.insert((id.clone(), metric.to_string()), now);
    }

    fn set_state(&self, id: &HypothesisId, state: CheckState) {
        let mut states = self.states.lock().unwrap();
        states.insert(id.clone(), state);
    }
}
