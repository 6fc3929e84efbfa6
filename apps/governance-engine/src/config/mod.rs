//! Configuration loading for the governance engine.
//!
//! Declarative YAML documents — hypotheses, constraints, factors, universe +
//! structural filters, regime thresholds, engine settings — are parsed into
//! typed objects with synchronous field-level validation. Any violation
//! fails the whole load with the offending file and field named; nothing is
//! silently coerced or dropped.
//!
//! # Usage
//!
//! ```rust,ignore
//! use governance_engine::config::load_config_dir;
//!
//! let config = load_config_dir("config")?;
//! println!("{} hypotheses", config.hypotheses.len());
//! ```

mod constraints;
mod factors;
mod hypotheses;
mod regime;
mod settings;
mod universe;

use std::collections::BTreeSet;
use std::path::Path;

use thiserror::Error;

use crate::error::ValidationError;
use crate::models::{Constraint, Factor, Hypothesis, RegimeThresholds};

pub use constraints::parse_constraints;
pub use factors::parse_factors;
pub use hypotheses::parse_hypotheses;
pub use regime::parse_regime_thresholds;
pub use settings::{EngineSettings, parse_settings};
pub use universe::{StructuralFilters, UniverseEntry, parse_universe};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse a YAML document.
    #[error("Failed to parse '{file}': {source}")]
    ParseError {
        /// The document that failed to parse.
        file: String,
        /// The underlying YAML error.
        source: serde_yaml_bw::Error,
    },

    /// A document parsed but failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Fully loaded and validated governance configuration.
#[derive(Debug, Clone)]
pub struct GovernanceConfig {
    /// Hypotheses, all in DRAFT status.
    pub hypotheses: Vec<Hypothesis>,
    /// Constraints.
    pub constraints: Vec<Constraint>,
    /// Registered factors.
    pub factors: Vec<Factor>,
    /// Base trading universe.
    pub universe: Vec<UniverseEntry>,
    /// Structural filter configuration.
    pub filters: StructuralFilters,
    /// Regime classification thresholds.
    pub regime: RegimeThresholds,
    /// Engine runtime settings.
    pub settings: EngineSettings,
}

/// Document file names expected inside a config directory.
const HYPOTHESES_FILE: &str = "hypotheses.yaml";
const CONSTRAINTS_FILE: &str = "constraints.yaml";
const FACTORS_FILE: &str = "factors.yaml";
const UNIVERSE_FILE: &str = "universe.yaml";
const REGIME_FILE: &str = "regime.yaml";
const SETTINGS_FILE: &str = "engine.yaml";

/// Load the full configuration from a directory of YAML documents.
///
/// `universe.yaml` is required; the other documents default to empty/default
/// content when absent. Environment variables are interpolated before
/// parsing.
///
/// # Errors
///
/// Returns a `ConfigError` naming the file (and field, for validation
/// failures) on the first violation found.
pub fn load_config_dir(dir: impl AsRef<Path>) -> Result<GovernanceConfig, ConfigError> {
    let dir = dir.as_ref();

    let hypotheses = match read_doc(dir, HYPOTHESES_FILE)? {
        Some(text) => parse_hypotheses(HYPOTHESES_FILE, &text)?,
        None => Vec::new(),
    };
    let constraints = match read_doc(dir, CONSTRAINTS_FILE)? {
        Some(text) => parse_constraints(CONSTRAINTS_FILE, &text)?,
        None => Vec::new(),
    };
    let factors = match read_doc(dir, FACTORS_FILE)? {
        Some(text) => parse_factors(FACTORS_FILE, &text)?,
        None => Vec::new(),
    };
    let universe_text = read_doc(dir, UNIVERSE_FILE)?.ok_or_else(|| ConfigError::ReadError {
        path: dir.join(UNIVERSE_FILE).display().to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "universe.yaml is required"),
    })?;
    let (universe, filters) = parse_universe(UNIVERSE_FILE, &universe_text)?;
    let regime = match read_doc(dir, REGIME_FILE)? {
        Some(text) => parse_regime_thresholds(REGIME_FILE, &text)?,
        None => RegimeThresholds::default(),
    };
    let settings = match read_doc(dir, SETTINGS_FILE)? {
        Some(text) => parse_settings(SETTINGS_FILE, &text)?,
        None => EngineSettings::default(),
    };

    let config = GovernanceConfig {
        hypotheses,
        constraints,
        factors,
        universe,
        filters,
        regime,
        settings,
    };
    validate_cross_references(&config)?;
    Ok(config)
}

/// Read one document if present, with env interpolation applied.
fn read_doc(dir: &Path, name: &str) -> Result<Option<String>, ConfigError> {
    let path = dir.join(name);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(Some(interpolate_env_vars(&contents)))
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
pub fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let mut result = input.to_string();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    for cap in re.captures_iter(input) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let Some(var_match) = cap.get(1) else {
            continue;
        };
        let full_match = full_match.as_str();
        let var_name = var_match.as_str();
        let default_value = cap.get(2).map(|m| m.as_str());

        let value = match std::env::var(var_name) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        };

        result = result.replace(full_match, &value);
    }

    result
}

/// Validate references across documents.
///
/// Every constraint activation must reference a defined hypothesis, and
/// every hypothesis's linked-constraint list must reference defined
/// constraints. Dangling references at load time are fatal; the same
/// condition at runtime fails closed with a warning instead.
fn validate_cross_references(config: &GovernanceConfig) -> Result<(), ConfigError> {
    let hypothesis_ids: BTreeSet<_> = config.hypotheses.iter().map(|h| &h.id).collect();
    let constraint_ids: BTreeSet<_> = config.constraints.iter().map(|c| &c.id).collect();

    for constraint in &config.constraints {
        for hypothesis_id in &constraint.activation.hypotheses {
            if !hypothesis_ids.contains(hypothesis_id) {
                return Err(ValidationError::new(
                    CONSTRAINTS_FILE,
                    format!("constraints.{}.activation.hypotheses", constraint.id),
                    format!("unknown hypothesis '{hypothesis_id}'"),
                )
                .into());
            }
        }
    }

    for hypothesis in &config.hypotheses {
        for constraint_id in &hypothesis.constraints {
            if !constraint_ids.contains(constraint_id) {
                return Err(ValidationError::new(
                    HYPOTHESES_FILE,
                    format!("hypotheses.{}.constraints", hypothesis.id),
                    format!("unknown constraint '{constraint_id}'"),
                )
                .into());
            }
        }
    }

    Ok(())
}
