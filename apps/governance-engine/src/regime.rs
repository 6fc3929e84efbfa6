//! Threshold-based regime classification.
//!
//! Classifies observed volatility/drawdown/dispersion into NORMAL,
//! TRANSITION, or STRESS. The classification is consumed only for position
//! pacing; it never feeds alpha computation.

use chrono::{DateTime, Utc};

use crate::models::{Regime, RegimeObservation, RegimeState, RegimeThresholds, ThresholdSet};

/// Classifies observations against a fixed threshold set.
#[derive(Debug, Clone)]
pub struct RegimeDetector {
    thresholds: RegimeThresholds,
}

impl RegimeDetector {
    /// Create a detector with the given thresholds.
    #[must_use]
    pub const fn new(thresholds: RegimeThresholds) -> Self {
        Self { thresholds }
    }

    /// The thresholds in force.
    #[must_use]
    pub const fn thresholds(&self) -> &RegimeThresholds {
        &self.thresholds
    }

    /// Classify an observation.
    ///
    /// A level is entered when any observed value meets or exceeds its
    /// threshold; stress is checked before transition.
    #[must_use]
    pub fn classify(&self, observed: RegimeObservation, detected_at: DateTime<Utc>) -> Regime {
        let state = if breaches(&observed, &self.thresholds.stress) {
            RegimeState::Stress
        } else if breaches(&observed, &self.thresholds.transition) {
            RegimeState::Transition
        } else {
            RegimeState::Normal
        };

        Regime {
            state,
            observed,
            detected_at,
            thresholds: self.thresholds,
        }
    }
}

fn breaches(observed: &RegimeObservation, thresholds: &ThresholdSet) -> bool {
    observed.volatility >= thresholds.volatility
        || observed.drawdown >= thresholds.drawdown
        || observed.dispersion >= thresholds.dispersion
}
