//! Factor registrations and their mandatory failure rules.
//!
//! Factor computation lives in the strategy layer. This registry only
//! enforces the failure-rule gate and enable/disable status.

use serde::{Deserialize, Serialize};

use super::hypothesis::CompareOp;
use super::identifiers::FactorId;

/// What happens when a factor's failure rule triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureAction {
    /// Disable the factor.
    Disable,
    /// Flag the factor for human review.
    Review,
}

/// Mandatory kill-switch rule for a factor. A factor without one is
/// rejected at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRule {
    /// Metric name, resolved through the metric registry.
    pub metric: String,
    /// Comparison operator applied as `value <op> threshold`.
    pub op: CompareOp,
    /// Numeric threshold.
    pub threshold: f64,
    /// Evaluation window in days.
    pub window_days: u32,
    /// Action when the rule triggers.
    pub action: FailureAction,
}

/// Information-coefficient evaluation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcConfig {
    /// Rolling IC window in days.
    #[serde(default = "default_ic_window_days")]
    pub window_days: u32,
    /// Minimum acceptable IC before the factor is suspect.
    #[serde(default = "default_min_ic")]
    pub min_ic: f64,
}

impl Default for IcConfig {
    fn default() -> Self {
        Self {
            window_days: default_ic_window_days(),
            min_ic: default_min_ic(),
        }
    }
}

const fn default_ic_window_days() -> u32 {
    63
}

const fn default_min_ic() -> f64 {
    0.02
}

/// Enable/disable status of a factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactorStatus {
    /// Factor available to the strategy layer.
    Enabled,
    /// Factor disabled by failure rule or human action.
    Disabled,
}

/// A registered factor. Computation is external; the registry gates
/// registration on the failure rule and tracks status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    /// Unique factor name.
    pub name: FactorId,
    /// Input feature names consumed by the factor computation.
    pub inputs: Vec<String>,
    /// Optional transform identifier (z-score, rank, ...).
    #[serde(default)]
    pub transform: Option<String>,
    /// IC evaluation configuration.
    #[serde(default)]
    pub ic: IcConfig,
    /// Mandatory failure rule.
    pub failure_rule: FailureRule,
    /// Current status.
    #[serde(default = "default_factor_status")]
    pub status: FactorStatus,
}

const fn default_factor_status() -> FactorStatus {
    FactorStatus::Enabled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_without_failure_rule_fails_to_parse() {
        let yaml = "name: earnings_momentum\ninputs: [eps_revision]\n";
        let result: Result<Factor, _> = serde_yaml_bw::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn factor_parses_with_failure_rule() {
        let yaml = concat!(
            "name: earnings_momentum\n",
            "inputs: [eps_revision, price_momentum_63d]\n",
            "transform: zscore\n",
            "failure_rule:\n",
            "  metric: rolling_ic\n",
            "  op: \"<\"\n",
            "  threshold: 0.0\n",
            "  window_days: 63\n",
            "  action: DISABLE\n",
        );
        let factor: Factor = serde_yaml_bw::from_str(yaml).unwrap();
        assert_eq!(factor.name.as_str(), "earnings_momentum");
        assert_eq!(factor.status, FactorStatus::Enabled);
        assert_eq!(factor.failure_rule.action, FailureAction::Disable);
        assert_eq!(factor.ic.window_days, 63);
    }
}
