//! Market regime classification for position pacing.
//!
//! Regime never feeds into alpha; the strategy layer consumes it only to
//! pace entries and exits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse market regime state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegimeState {
    /// Typical conditions.
    Normal,
    /// Elevated readings; pacing should slow.
    Transition,
    /// Stressed conditions; pacing should pause or drastically slow.
    Stress,
}

/// The observed values a regime classification was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeObservation {
    /// Realized volatility reading (annualized fraction).
    pub volatility: f64,
    /// Peak-to-trough drawdown reading (fraction).
    pub drawdown: f64,
    /// Cross-sectional return dispersion reading (fraction).
    pub dispersion: f64,
}

/// One threshold row: a regime level is entered when any observed value
/// meets or exceeds its corresponding threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    /// Volatility threshold.
    pub volatility: f64,
    /// Drawdown threshold.
    pub drawdown: f64,
    /// Dispersion threshold.
    pub dispersion: f64,
}

/// Threshold configuration for regime classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeThresholds {
    /// Entering TRANSITION.
    #[serde(default = "default_transition_thresholds")]
    pub transition: ThresholdSet,
    /// Entering STRESS.
    #[serde(default = "default_stress_thresholds")]
    pub stress: ThresholdSet,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            transition: default_transition_thresholds(),
            stress: default_stress_thresholds(),
        }
    }
}

const fn default_transition_thresholds() -> ThresholdSet {
    ThresholdSet {
        volatility: 0.25,
        drawdown: 0.08,
        dispersion: 0.30,
    }
}

const fn default_stress_thresholds() -> ThresholdSet {
    ThresholdSet {
        volatility: 0.40,
        drawdown: 0.15,
        dispersion: 0.50,
    }
}

/// A regime classification with full provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regime {
    /// Classified state.
    pub state: RegimeState,
    /// The observation that produced it.
    pub observed: RegimeObservation,
    /// When the classification was made.
    pub detected_at: DateTime<Utc>,
    /// The threshold set in force at classification time.
    pub thresholds: RegimeThresholds,
}
