//! Regime threshold configuration.

use serde::Deserialize;

use crate::error::ValidationError;
use crate::models::RegimeThresholds;

use super::ConfigError;

#[derive(Debug, Deserialize)]
struct RegimeDoc {
    #[serde(default)]
    thresholds: RegimeThresholds,
}

/// Parse and validate the regime thresholds document.
///
/// # Errors
///
/// Returns `ConfigError` on YAML errors, non-finite values, or threshold
/// rows that are not ordered (every transition threshold must sit below its
/// stress counterpart).
pub fn parse_regime_thresholds(file: &str, yaml: &str) -> Result<RegimeThresholds, ConfigError> {
    let doc: RegimeDoc = serde_yaml_bw::from_str(yaml).map_err(|e| ConfigError::ParseError {
        file: file.to_string(),
        source: e,
    })?;

    let t = doc.thresholds;
    for (field, transition, stress) in [
        ("volatility", t.transition.volatility, t.stress.volatility),
        ("drawdown", t.transition.drawdown, t.stress.drawdown),
        ("dispersion", t.transition.dispersion, t.stress.dispersion),
    ] {
        if !transition.is_finite() || !stress.is_finite() || transition <= 0.0 {
            return Err(ValidationError::new(
                file,
                format!("thresholds.{field}"),
                "thresholds must be finite positive numbers",
            )
            .into());
        }
        if transition >= stress {
            return Err(ValidationError::new(
                file,
                format!("thresholds.{field}"),
                "transition threshold must be below the stress threshold",
            )
            .into());
        }
    }

    Ok(t)
}
