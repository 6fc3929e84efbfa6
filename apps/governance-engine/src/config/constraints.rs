//! Constraint document parsing and validation.
//!
//! Numeric action fields are declared as plain floats at the config edge
//! and converted to `Decimal` for the domain objects; the closed action
//! field set is enforced here by `deny_unknown_fields` and again by the
//! standalone allowlist validator in the isolation gate.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::ValidationError;
use crate::models::{
    ActivationRule, Applicability, Constraint, ConstraintActions, ConstraintId, Guardrails,
    PoolBias, StopMode, StrategyId,
};

use super::ConfigError;

#[derive(Debug, Deserialize)]
struct ConstraintsDoc {
    #[serde(default)]
    constraints: Vec<ConstraintDoc>,
}

#[derive(Debug, Deserialize)]
struct ConstraintDoc {
    id: ConstraintId,
    title: String,
    #[serde(default)]
    applicability: Applicability,
    #[serde(default)]
    activation: ActivationRule,
    #[serde(default)]
    actions: ActionsDoc,
    #[serde(default)]
    guardrails: GuardrailsDoc,
    #[serde(default = "default_priority")]
    priority: u32,
}

const fn default_priority() -> u32 {
    100
}

/// Raw actions with float-typed numeric fields. The field set mirrors
/// [`ConstraintActions`] exactly; anything else fails deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActionsDoc {
    #[serde(default)]
    enable_strategy: Option<StrategyId>,
    #[serde(default)]
    disable_strategy: Option<StrategyId>,
    #[serde(default)]
    pool_bias: Option<PoolBiasDoc>,
    #[serde(default)]
    veto_downgrade: Option<bool>,
    #[serde(default)]
    risk_budget_multiplier: Option<f64>,
    #[serde(default)]
    holding_extension_days: Option<u32>,
    #[serde(default)]
    position_cap_multiplier: Option<f64>,
    #[serde(default)]
    stop_mode: Option<StopMode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum PoolBiasDoc {
    Include,
    Exclude,
    Prioritize { weight: f64 },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GuardrailsDoc {
    #[serde(default)]
    max_position_pct: Option<f64>,
    #[serde(default)]
    max_gross_exposure_delta: Option<f64>,
    #[serde(default)]
    max_drawdown_addon: Option<f64>,
}

/// Parse and validate a constraints document.
///
/// # Errors
///
/// Returns `ConfigError` on YAML errors (including any action field outside
/// the closed allowlist) or on any field-level violation.
pub fn parse_constraints(file: &str, yaml: &str) -> Result<Vec<Constraint>, ConfigError> {
    let doc: ConstraintsDoc =
        serde_yaml_bw::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: file.to_string(),
            source: e,
        })?;

    let mut seen = std::collections::BTreeSet::new();
    let mut constraints = Vec::with_capacity(doc.constraints.len());
    for raw in doc.constraints {
        if raw.id.as_str().is_empty() {
            return Err(
                ValidationError::new(file, "constraints.id", "id must not be empty").into(),
            );
        }
        if !seen.insert(raw.id.clone()) {
            return Err(ValidationError::new(
                file,
                format!("constraints.{}.id", raw.id),
                "duplicate constraint id",
            )
            .into());
        }
        constraints.push(convert_constraint(file, raw)?);
    }
    Ok(constraints)
}

fn convert_constraint(file: &str, raw: ConstraintDoc) -> Result<Constraint, ConfigError> {
    let prefix = format!("constraints.{}", raw.id);

    if raw.title.trim().is_empty() {
        return Err(ValidationError::new(
            file,
            format!("{prefix}.title"),
            "title must not be empty",
        )
        .into());
    }

    let actions = convert_actions(file, &prefix, raw.actions)?;
    let guardrails = convert_guardrails(file, &prefix, raw.guardrails)?;

    if actions.is_empty() && guardrails.is_unbounded() {
        return Err(ValidationError::new(
            file,
            format!("{prefix}.actions"),
            "constraint must set at least one action or guardrail",
        )
        .into());
    }

    Ok(Constraint {
        id: raw.id,
        title: raw.title,
        applicability: raw.applicability,
        activation: raw.activation,
        actions,
        guardrails,
        priority: raw.priority,
    })
}

fn convert_actions(
    file: &str,
    prefix: &str,
    raw: ActionsDoc,
) -> Result<ConstraintActions, ConfigError> {
    let risk_budget_multiplier = raw
        .risk_budget_multiplier
        .map(|v| {
            to_positive_decimal(file, &format!("{prefix}.actions.risk_budget_multiplier"), v)
        })
        .transpose()?;
    let position_cap_multiplier = raw
        .position_cap_multiplier
        .map(|v| {
            to_positive_decimal(file, &format!("{prefix}.actions.position_cap_multiplier"), v)
        })
        .transpose()?;
    let pool_bias = raw
        .pool_bias
        .map(|bias| match bias {
            PoolBiasDoc::Include => Ok::<PoolBias, ConfigError>(PoolBias::Include),
            PoolBiasDoc::Exclude => Ok(PoolBias::Exclude),
            PoolBiasDoc::Prioritize { weight } => Ok(PoolBias::Prioritize {
                weight: to_positive_decimal(
                    file,
                    &format!("{prefix}.actions.pool_bias.weight"),
                    weight,
                )?,
            }),
        })
        .transpose()?;

    Ok(ConstraintActions {
        enable_strategy: raw.enable_strategy,
        disable_strategy: raw.disable_strategy,
        pool_bias,
        veto_downgrade: raw.veto_downgrade,
        risk_budget_multiplier,
        holding_extension_days: raw.holding_extension_days,
        position_cap_multiplier,
        stop_mode: raw.stop_mode,
    })
}

fn convert_guardrails(
    file: &str,
    prefix: &str,
    raw: GuardrailsDoc,
) -> Result<Guardrails, ConfigError> {
    let max_position_pct = raw
        .max_position_pct
        .map(|v| {
            let field = format!("{prefix}.guardrails.max_position_pct");
            let value = to_positive_decimal(file, &field, v)?;
            if v > 1.0 {
                return Err(ConfigError::Validation(ValidationError::new(
                    file,
                    field,
                    "position fraction must not exceed 1.0",
                )));
            }
            Ok(value)
        })
        .transpose()?;
    let max_gross_exposure_delta = raw
        .max_gross_exposure_delta
        .map(|v| {
            to_positive_decimal(file, &format!("{prefix}.guardrails.max_gross_exposure_delta"), v)
        })
        .transpose()?;
    let max_drawdown_addon = raw
        .max_drawdown_addon
        .map(|v| to_positive_decimal(file, &format!("{prefix}.guardrails.max_drawdown_addon"), v))
        .transpose()?;

    Ok(Guardrails {
        max_position_pct,
        max_gross_exposure_delta,
        max_drawdown_addon,
    })
}

fn to_positive_decimal(file: &str, field: &str, value: f64) -> Result<Decimal, ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::Validation(ValidationError::new(
            file,
            field,
            "value must be a finite positive number",
        )));
    }
    Decimal::try_from(value).map_err(|e| {
        ConfigError::Validation(ValidationError::new(file, field, e.to_string()))
    })
}
