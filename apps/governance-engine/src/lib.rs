// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Governance Engine - Rust Core Library
//!
//! The hypothesis governance engine for the Thesis trading system. It
//! mediates between human-authored market beliefs (hypotheses) and the
//! automated strategy layer under one hard invariant: governance data may
//! influence *when* and *how much* to trade, never *what* to trade.
//!
//! # Components
//!
//! - `config`: declarative YAML loading with fail-fast validation
//! - `models`: typed domain objects (hypotheses, constraints, factors,
//!   pools, resolutions, regimes, audit entries, alerts)
//! - `registry`: versioned immutable snapshots with atomic publish
//! - `pool`: the deterministic, audited pool builder
//! - `resolver`: per-symbol constraint resolution with hot-path caching
//! - `gate`: build-time isolation checks (import scanner + allowlist)
//! - `monitor`: the scheduled falsifier monitor and metric registry
//! - `audit`: the append-only audit log
//! - `alert`: structured alert generation (delivery is external)
//! - `regime`: threshold regime classification for position pacing
//! - `engine`: wiring facade and the strategy boundary
//!
//! # The red line
//!
//! Strategy code consumes only pre-resolved scalars ([`models::Pool`],
//! [`models::ResolvedConstraints`], [`models::Regime`]). The isolation gate
//! enforces at build time that alpha computation never references the
//! hypothesis or constraint modules.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod alert;
pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod models;
pub mod monitor;
pub mod pool;
pub mod regime;
pub mod registry;
pub mod resolver;
pub mod telemetry;

pub use alert::{AlertSink, TracingAlertSink};
pub use audit::{AuditError, AuditLogger, AuditStore, InMemoryAuditStore};
pub use config::{ConfigError, GovernanceConfig, load_config_dir};
pub use engine::GovernanceEngine;
pub use error::{GovernanceError, ValidationError};
pub use gate::{GateError, GateReport, GateViolation};
pub use models::{
    Alert, AuditEventType, AuditLogEntry, AuditQuery, Constraint, Hypothesis, Pool, Regime,
    ResolvedConstraints, Symbol,
};
pub use monitor::{FalsifierMonitor, MetricError, MetricProvider, MetricRegistry};
pub use pool::{EmptyPoolError, PoolBuilder};
pub use regime::RegimeDetector;
pub use registry::{GovernanceSnapshot, RegistryError, SharedRegistries};
pub use resolver::ConstraintResolver;
