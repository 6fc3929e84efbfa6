//! Engine wiring and the strategy boundary.
//!
//! [`GovernanceEngine`] owns the registries, resolver, pool builder, audit
//! logger, alert sink, and regime detector, and exposes the only surface the
//! strategy layer may consume: the current [`Pool`], per-symbol
//! [`ResolvedConstraints`] scalars, and the current [`Regime`]. Hypothesis
//! text and raw constraint objects never cross this boundary.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::alert::{AlertSink, TracingAlertSink};
use crate::audit::AuditLogger;
use crate::config::{EngineSettings, GovernanceConfig};
use crate::error::GovernanceError;
use crate::models::{
    Actor, Alert, AlertSeverity, AuditEventType, AuditLogEntry, ConstraintId, HypothesisId,
    HypothesisStatus, Pool, Regime, RegimeObservation, ResolvedConstraints, Symbol, TraceId,
};
use crate::monitor::{FalsifierMonitor, MetricRegistry};
use crate::pool::{EmptyPoolError, PoolBuilder};
use crate::regime::RegimeDetector;
use crate::registry::{RegistryError, SharedRegistries};
use crate::resolver::ConstraintResolver;

/// The governance engine facade.
pub struct GovernanceEngine {
    registries: Arc<SharedRegistries>,
    resolver: Arc<ConstraintResolver>,
    pool_builder: PoolBuilder,
    audit: Arc<AuditLogger>,
    alerts: Arc<dyn AlertSink>,
    metrics: Arc<MetricRegistry>,
    detector: RegimeDetector,
    settings: EngineSettings,
    current_pool: RwLock<Option<Arc<Pool>>>,
    current_regime: RwLock<Option<Regime>>,
}

impl GovernanceEngine {
    /// Build an engine from validated configuration with default adapters
    /// (in-memory audit store, tracing alert sink).
    pub fn from_config(config: GovernanceConfig) -> Result<Self, GovernanceError> {
        Self::with_components(
            config,
            Arc::new(AuditLogger::in_memory()),
            Arc::new(TracingAlertSink),
        )
    }

    /// Build an engine with explicit audit and alert adapters.
    pub fn with_components(
        config: GovernanceConfig,
        audit: Arc<AuditLogger>,
        alerts: Arc<dyn AlertSink>,
    ) -> Result<Self, GovernanceError> {
        let registries = Arc::new(SharedRegistries::new());
        for hypothesis in config.hypotheses {
            registries.register_hypothesis(hypothesis)?;
        }
        for constraint in config.constraints {
            registries.register_constraint(constraint)?;
        }
        for factor in config.factors {
            registries.register_factor(factor)?;
        }

        let resolver = Arc::new(ConstraintResolver::new(
            registries.clone(),
            audit.clone(),
            Duration::from_secs(config.settings.resolver_ttl_secs),
        ));

        Ok(Self {
            registries,
            resolver,
            pool_builder: PoolBuilder::new(config.universe, config.filters),
            audit,
            alerts,
            metrics: Arc::new(MetricRegistry::new()),
            detector: RegimeDetector::new(config.regime),
            settings: config.settings,
            current_pool: RwLock::new(None),
            current_regime: RwLock::new(None),
        })
    }

    /// Load configuration from a directory and build an engine with default
    /// adapters.
    pub fn from_config_dir(dir: impl AsRef<std::path::Path>) -> Result<Self, GovernanceError> {
        let config = crate::config::load_config_dir(dir)?;
        Self::from_config(config)
    }

    // ------------------------------------------------------------------
    // Human actions
    // ------------------------------------------------------------------

    /// Approve a hypothesis (the explicit human action for DRAFT → ACTIVE),
    /// auditing every constraint the approval activates.
    pub fn approve_hypothesis(&self, id: &HypothesisId) -> Result<(), RegistryError> {
        let before = self.active_constraint_set();
        self.registries.approve_hypothesis(id)?;
        self.record_activation_diff(id, &before)?;
        Ok(())
    }

    /// Sunset or reject a hypothesis on human authority, auditing every
    /// constraint the transition deactivates.
    pub fn retire_hypothesis(
        &self,
        id: &HypothesisId,
        to: HypothesisStatus,
    ) -> Result<(), RegistryError> {
        let before = self.active_constraint_set();
        self.registries.transition_hypothesis(id, to, Actor::Human)?;
        self.record_activation_diff(id, &before)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Strategy boundary
    // ------------------------------------------------------------------

    /// Build a fresh pool from the current registry snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyPoolError`] when every symbol was excluded; the
    /// failure is also alerted, and callers must treat it as blocking.
    pub fn build_pool(&self) -> Result<Arc<Pool>, EmptyPoolError> {
        let snapshot = self.registries.snapshot();
        match self.pool_builder.build(&snapshot) {
            Ok(pool) => {
                let pool = Arc::new(pool);
                let _ = self.audit.append(
                    AuditLogEntry::new(pool.built_at, AuditEventType::PoolBuilt).with_details(
                        json!({
                            "version": pool.version,
                            "content_hash": pool.content_hash,
                            "members": pool.symbols.len(),
                            "decisions": pool.decisions.len(),
                        }),
                    ),
                );
                *self.current_pool.write().unwrap() = Some(pool.clone());
                Ok(pool)
            }
            Err(e) => {
                self.alerts.dispatch(
                    &Alert::new(
                        AlertSeverity::Critical,
                        "Pool construction produced no symbols",
                        e.to_string(),
                    )
                    .with_recommended_action(
                        "halt strategy execution and review filters/overrides",
                    ),
                );
                Err(e)
            }
        }
    }

    /// The most recently built pool, if any.
    #[must_use]
    pub fn current_pool(&self) -> Option<Arc<Pool>> {
        self.current_pool.read().unwrap().clone()
    }

    /// Resolve the aggregate constraint effect for a symbol.
    #[must_use]
    pub fn resolve(&self, symbol: &Symbol) -> Arc<ResolvedConstraints> {
        self.resolver.resolve(symbol)
    }

    /// Resolve with a trace id linking audit entries to a trading decision.
    #[must_use]
    pub fn resolve_traced(
        &self,
        symbol: &Symbol,
        trace: Option<&TraceId>,
    ) -> Arc<ResolvedConstraints> {
        self.resolver.resolve_traced(symbol, trace)
    }

    /// Classify a regime observation, auditing state changes, and return
    /// the classification.
    pub fn observe_regime(&self, observed: RegimeObservation) -> Regime {
        let regime = self.detector.classify(observed, Utc::now());
        let mut current = self.current_regime.write().unwrap();
        let previous_state = current.as_ref().map(|r| r.state);
        if previous_state != Some(regime.state) {
            tracing::info!(?previous_state, state = ?regime.state, "Regime changed");
            let _ = self.audit.append(
                AuditLogEntry::new(regime.detected_at, AuditEventType::RegimeChanged)
                    .with_details(json!({
                        "previous": previous_state,
                        "state": regime.state,
                        "volatility": observed.volatility,
                        "drawdown": observed.drawdown,
                        "dispersion": observed.dispersion,
                    })),
            );
        }
        *current = Some(regime.clone());
        regime
    }

    /// The most recent regime classification, if any.
    #[must_use]
    pub fn current_regime(&self) -> Option<Regime> {
        self.current_regime.read().unwrap().clone()
    }

    // ------------------------------------------------------------------
    // Wiring accessors
    // ------------------------------------------------------------------

    /// The audit query interface.
    #[must_use]
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// The metric provider registry consumed by the falsifier monitor.
    #[must_use]
    pub fn metrics(&self) -> &Arc<MetricRegistry> {
        &self.metrics
    }

    /// The shared registries (operations tooling; not part of the strategy
    /// boundary).
    #[must_use]
    pub fn registries(&self) -> &Arc<SharedRegistries> {
        &self.registries
    }

    /// Construct the falsifier monitor over this engine's components.
    #[must_use]
    pub fn monitor(&self) -> Arc<FalsifierMonitor> {
        Arc::new(FalsifierMonitor::new(
            self.registries.clone(),
            self.metrics.clone(),
            self.audit.clone(),
            self.resolver.clone(),
            self.alerts.clone(),
            self.settings.clone(),
        ))
    }

    /// Spawn the falsifier monitor as a background task.
    #[must_use]
    pub fn spawn_monitor(&self, shutdown_rx: broadcast::Receiver<()>) -> JoinHandle<()> {
        let monitor = self.monitor();
        tokio::spawn(monitor.run(shutdown_rx))
    }

    fn active_constraint_set(&self) -> BTreeSet<ConstraintId> {
        self.registries
            .snapshot()
            .active_constraint_ids()
            .into_iter()
            .collect()
    }

    /// Audit the activation delta caused by a hypothesis status change and
    /// invalidate the resolver cache if anything changed.
    fn record_activation_diff(
        &self,
        hypothesis_id: &HypothesisId,
        before: &BTreeSet<ConstraintId>,
    ) -> Result<(), RegistryError> {
        let after = self.active_constraint_set();
        let now = Utc::now();

        for activated in after.difference(before) {
            let _ = self.audit.append(
                AuditLogEntry::new(now, AuditEventType::ConstraintActivated)
                    .with_hypothesis(hypothesis_id.clone())
                    .with_constraint(activated.clone())
                    .with_details(json!({"cause": "hypothesis_status_change"})),
            );
        }
        for deactivated in before.difference(&after) {
            let _ = self.audit.append(
                AuditLogEntry::new(now, AuditEventType::ConstraintDeactivated)
                    .with_hypothesis(hypothesis_id.clone())
                    .with_constraint(deactivated.clone())
                    .with_details(json!({"cause": "hypothesis_status_change"})),
            );
        }

        if before != &after {
            self.resolver.invalidate_all();
        }
        Ok(())
    }
}
