//! Metric provider port and registry.
//!
//! The engine computes no metrics itself. Falsifier evaluation asks a
//! pluggable provider, keyed by metric name, for a value over a window; an
//! unavailable metric is a recoverable condition, never a trigger.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::HypothesisScope;

/// Metric fetch errors.
#[derive(Debug, Error)]
pub enum MetricError {
    /// The provider has no value for this metric/window right now.
    /// Recoverable: the check is skipped, absence of data is never evidence
    /// of falsification.
    #[error("metric '{metric}' unavailable: {reason}")]
    Unavailable {
        /// Metric name.
        metric: String,
        /// Why no value is available.
        reason: String,
    },

    /// The provider failed outright.
    #[error("metric provider failed for '{metric}': {message}")]
    Provider {
        /// Metric name.
        metric: String,
        /// Provider diagnostic.
        message: String,
    },
}

/// A source of metric values, pluggable per metric name.
#[async_trait]
pub trait MetricProvider: Send + Sync {
    /// Fetch the metric's value for a scope over a trailing window.
    async fn get_value(
        &self,
        metric: &str,
        scope: &HypothesisScope,
        window_days: u32,
    ) -> Result<f64, MetricError>;
}

/// Registry of metric providers keyed by metric name.
#[derive(Default)]
pub struct MetricRegistry {
    providers: RwLock<HashMap<String, Arc<dyn MetricProvider>>>,
}

impl MetricRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider for a metric name, replacing any existing one.
    pub fn register(&self, metric: impl Into<String>, provider: Arc<dyn MetricProvider>) {
        let metric = metric.into();
        let mut providers = self.providers.write().unwrap();
        providers.insert(metric, provider);
    }

    /// Look up the provider for a metric.
    #[must_use]
    pub fn provider_for(&self, metric: &str) -> Option<Arc<dyn MetricProvider>> {
        self.providers.read().unwrap().get(metric).cloned()
    }

    /// Registered metric names, sorted.
    #[must_use]
    pub fn metric_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

/// Fixed-value provider for tests and dry runs.
pub struct StaticMetricProvider {
    value: f64,
}

impl StaticMetricProvider {
    /// Provider that always returns `value`.
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self { value }
    }
}

#[async_trait]
impl MetricProvider for StaticMetricProvider {
    async fn get_value(
        &self,
        _metric: &str,
        _scope: &HypothesisScope,
        _window_days: u32,
    ) -> Result<f64, MetricError> {
        Ok(self.value)
    }
}
