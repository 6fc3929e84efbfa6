//! Hypothesis document parsing and validation.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::ValidationError;
use crate::models::{
    ConstraintId, Falsifier, Hypothesis, HypothesisId, HypothesisScope, HypothesisStatus,
};

use super::ConfigError;

#[derive(Debug, Deserialize)]
struct HypothesesDoc {
    #[serde(default)]
    hypotheses: Vec<HypothesisDoc>,
}

/// Raw hypothesis declaration. Status is not configurable: every hypothesis
/// enters the system as DRAFT and only an explicit human approval activates
/// it.
#[derive(Debug, Deserialize)]
struct HypothesisDoc {
    id: HypothesisId,
    title: String,
    statement: String,
    #[serde(default)]
    scope: HypothesisScope,
    #[serde(default = "default_review_cadence_days")]
    review_cadence_days: u32,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    evidence: Vec<String>,
    #[serde(default)]
    falsifiers: Vec<Falsifier>,
    #[serde(default)]
    constraints: Vec<ConstraintId>,
}

const fn default_review_cadence_days() -> u32 {
    7
}

/// Parse and validate a hypotheses document.
///
/// # Errors
///
/// Returns `ConfigError` on YAML errors or on any field-level violation,
/// including the gate-level invariant that every hypothesis carries at
/// least one falsifier.
pub fn parse_hypotheses(file: &str, yaml: &str) -> Result<Vec<Hypothesis>, ConfigError> {
    let doc: HypothesesDoc =
        serde_yaml_bw::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: file.to_string(),
            source: e,
        })?;

    let mut seen = std::collections::BTreeSet::new();
    let mut hypotheses = Vec::with_capacity(doc.hypotheses.len());
    for raw in doc.hypotheses {
        validate_hypothesis(file, &raw)?;
        if !seen.insert(raw.id.clone()) {
            return Err(ValidationError::new(
                file,
                format!("hypotheses.{}.id", raw.id),
                "duplicate hypothesis id",
            )
            .into());
        }
        hypotheses.push(Hypothesis {
            id: raw.id,
            title: raw.title,
            statement: raw.statement,
            scope: raw.scope,
            status: HypothesisStatus::Draft,
            review_cadence_days: raw.review_cadence_days,
            created_at: raw.created_at.unwrap_or_else(Utc::now),
            evidence: raw.evidence,
            falsifiers: raw.falsifiers,
            constraints: raw.constraints,
        });
    }
    Ok(hypotheses)
}

fn validate_hypothesis(file: &str, raw: &HypothesisDoc) -> Result<(), ValidationError> {
    let prefix = format!("hypotheses.{}", raw.id);

    if raw.id.as_str().is_empty() {
        return Err(ValidationError::new(file, "hypotheses.id", "id must not be empty"));
    }
    if raw.title.trim().is_empty() {
        return Err(ValidationError::new(
            file,
            format!("{prefix}.title"),
            "title must not be empty",
        ));
    }
    if raw.statement.trim().is_empty() {
        return Err(ValidationError::new(
            file,
            format!("{prefix}.statement"),
            "statement must not be empty",
        ));
    }
    if raw.review_cadence_days == 0 {
        return Err(ValidationError::new(
            file,
            format!("{prefix}.review_cadence_days"),
            "review cadence must be at least 1 day",
        ));
    }

    // Gate-level invariant: a hypothesis with no falsifiers can never be
    // approved, so it is rejected at the door.
    if raw.falsifiers.is_empty() {
        return Err(ValidationError::new(
            file,
            format!("{prefix}.falsifiers"),
            "at least one falsifier is required",
        ));
    }

    for (idx, falsifier) in raw.falsifiers.iter().enumerate() {
        let falsifier_prefix = format!("{prefix}.falsifiers[{idx}]");
        if falsifier.metric.trim().is_empty() {
            return Err(ValidationError::new(
                file,
                format!("{falsifier_prefix}.metric"),
                "metric name must not be empty",
            ));
        }
        if !falsifier.threshold.is_finite() {
            return Err(ValidationError::new(
                file,
                format!("{falsifier_prefix}.threshold"),
                "threshold must be a finite number",
            ));
        }
        if falsifier.window_days == 0 {
            return Err(ValidationError::new(
                file,
                format!("{falsifier_prefix}.window_days"),
                "evaluation window must be at least 1 day",
            ));
        }
        if falsifier.cadence_days == Some(0) {
            return Err(ValidationError::new(
                file,
                format!("{falsifier_prefix}.cadence_days"),
                "cadence override must be at least 1 day",
            ));
        }
    }

    Ok(())
}
