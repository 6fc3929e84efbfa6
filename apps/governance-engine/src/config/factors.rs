//! Factor document parsing and validation.

use serde::Deserialize;

use crate::error::ValidationError;
use crate::models::{Factor, FactorId, FactorStatus, FailureRule, IcConfig};

use super::ConfigError;

#[derive(Debug, Deserialize)]
struct FactorsDoc {
    #[serde(default)]
    factors: Vec<FactorDoc>,
}

#[derive(Debug, Deserialize)]
struct FactorDoc {
    name: FactorId,
    #[serde(default)]
    inputs: Vec<String>,
    #[serde(default)]
    transform: Option<String>,
    #[serde(default)]
    ic: IcConfig,
    // Optional at the parse layer so its absence is reported as a named
    // validation failure rather than a bare serde error.
    #[serde(default)]
    failure_rule: Option<FailureRule>,
}

/// Parse and validate a factors document.
///
/// # Errors
///
/// Returns `ConfigError` on YAML errors or on any field-level violation,
/// including the gate-level invariant that every factor declares a failure
/// rule.
pub fn parse_factors(file: &str, yaml: &str) -> Result<Vec<Factor>, ConfigError> {
    let doc: FactorsDoc = serde_yaml_bw::from_str(yaml).map_err(|e| ConfigError::ParseError {
        file: file.to_string(),
        source: e,
    })?;

    let mut seen = std::collections::BTreeSet::new();
    let mut factors = Vec::with_capacity(doc.factors.len());
    for raw in doc.factors {
        let prefix = format!("factors.{}", raw.name);
        if raw.name.as_str().is_empty() {
            return Err(
                ValidationError::new(file, "factors.name", "name must not be empty").into(),
            );
        }
        if !seen.insert(raw.name.clone()) {
            return Err(ValidationError::new(
                file,
                format!("{prefix}.name"),
                "duplicate factor name",
            )
            .into());
        }
        if raw.inputs.is_empty() {
            return Err(ValidationError::new(
                file,
                format!("{prefix}.inputs"),
                "at least one input feature is required",
            )
            .into());
        }

        // Gate-level invariant: a factor without a kill switch is rejected.
        let failure_rule = raw.failure_rule.ok_or_else(|| {
            ValidationError::new(
                file,
                format!("{prefix}.failure_rule"),
                "a failure rule is required",
            )
        })?;
        if !failure_rule.threshold.is_finite() {
            return Err(ValidationError::new(
                file,
                format!("{prefix}.failure_rule.threshold"),
                "threshold must be a finite number",
            )
            .into());
        }
        if failure_rule.window_days == 0 {
            return Err(ValidationError::new(
                file,
                format!("{prefix}.failure_rule.window_days"),
                "evaluation window must be at least 1 day",
            )
            .into());
        }

        factors.push(Factor {
            name: raw.name,
            inputs: raw.inputs,
            transform: raw.transform,
            ic: raw.ic,
            failure_rule,
            status: FactorStatus::Enabled,
        });
    }
    Ok(factors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureAction;

    const VALID: &str = concat!(
        "factors:\n",
        "  - name: earnings_momentum\n",
        "    inputs: [eps_revision, price_momentum_63d]\n",
        "    transform: zscore\n",
        "    failure_rule:\n",
        "      metric: rolling_ic\n",
        "      op: \"<\"\n",
        "      threshold: 0.0\n",
        "      window_days: 63\n",
        "      action: DISABLE\n",
    );

    #[test]
    fn parses_valid_document() {
        let factors = parse_factors("factors.yaml", VALID).unwrap();
        assert_eq!(factors.len(), 1);
        assert_eq!(factors[0].failure_rule.action, FailureAction::Disable);
        assert_eq!(factors[0].status, FactorStatus::Enabled);
    }

    #[test]
    fn rejects_factor_without_failure_rule() {
        let yaml = concat!(
            "factors:\n",
            "  - name: naked_factor\n",
            "    inputs: [something]\n",
        );
        let err = parse_factors("factors.yaml", yaml).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("failure_rule"), "got: {message}");
        assert!(message.contains("naked_factor"), "got: {message}");
    }

    #[test]
    fn rejects_factor_without_inputs() {
        let yaml = concat!(
            "factors:\n",
            "  - name: inputless\n",
            "    failure_rule:\n",
            "      metric: rolling_ic\n",
            "      op: \"<\"\n",
            "      threshold: 0.0\n",
            "      window_days: 63\n",
            "      action: REVIEW\n",
        );
        let err = parse_factors("factors.yaml", yaml).unwrap_err();
        assert!(err.to_string().contains("inputs"));
    }
}
