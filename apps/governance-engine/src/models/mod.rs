//! Core domain types for the governance engine.
//!
//! Everything here is a plain serde-serializable value object. Registries
//! own the entity sets; the resolver and pool builder own only derived
//! caches built from these types.

mod alert;
mod audit;
mod constraint;
mod factor;
mod hypothesis;
mod identifiers;
mod pool;
mod regime;
mod resolved;

pub use alert::{Alert, AlertChannel, AlertSeverity};
pub use audit::{AuditEventType, AuditLogEntry, AuditQuery};
pub use constraint::{
    ALLOWED_ACTION_FIELDS, ActivationRule, Applicability, Constraint, ConstraintActions,
    Guardrails, PoolBias, StopMode,
};
pub use factor::{Factor, FactorStatus, FailureAction, FailureRule, IcConfig};
pub use hypothesis::{
    Actor, CompareOp, Falsifier, Hypothesis, HypothesisScope, HypothesisStatus, TriggerAction,
};
pub use identifiers::{ConstraintId, FactorId, HypothesisId, StrategyId, Symbol, TraceId};
pub use pool::{Pool, PoolDecision, PoolDecisionKind};
pub use regime::{Regime, RegimeObservation, RegimeState, RegimeThresholds, ThresholdSet};
pub use resolved::{ConstraintEffect, ResolvedConstraints};
