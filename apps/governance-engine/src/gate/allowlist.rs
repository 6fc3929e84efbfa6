//! Standalone action-field allowlist validator.
//!
//! Mirrors the loader-time `deny_unknown_fields` check but runs against raw
//! constraint documents, so CI can reject a bad config snapshot without
//! loading it into an engine.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::models::ALLOWED_ACTION_FIELDS;

use super::{GateError, GateReport, GateViolation};

/// Permissive view of a constraints document: only ids and raw action keys
/// are extracted, everything else is ignored.
#[derive(Debug, Deserialize)]
struct RawConstraintsDoc {
    #[serde(default)]
    constraints: Vec<RawConstraint>,
}

#[derive(Debug, Deserialize)]
struct RawConstraint {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    actions: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(flatten)]
    _rest: BTreeMap<String, serde_json::Value>,
}

/// Validate a constraints file on disk.
///
/// # Errors
///
/// Returns [`GateError`] when the file cannot be read or parsed as YAML.
pub fn validate_constraints_file(path: &Path) -> Result<GateReport, GateError> {
    let contents = std::fs::read_to_string(path).map_err(|e| GateError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate_constraints_str(path, &contents)
}

/// Validate a raw constraints document against the closed action field set.
///
/// Pure function of the document text; the `path` only labels violations.
///
/// # Errors
///
/// Returns [`GateError`] when the document is not parseable YAML.
pub fn validate_constraints_str(path: &Path, yaml: &str) -> Result<GateReport, GateError> {
    let doc: RawConstraintsDoc = serde_yaml_bw::from_str(yaml).map_err(|e| GateError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut report = GateReport::default();
    for (idx, constraint) in doc.constraints.iter().enumerate() {
        let label = constraint
            .id
            .clone()
            .unwrap_or_else(|| format!("#{idx}"));
        let Some(actions) = &constraint.actions else {
            continue;
        };
        for field in actions.keys() {
            if !ALLOWED_ACTION_FIELDS.contains(&field.as_str()) {
                report.violations.push(GateViolation {
                    file: path.to_path_buf(),
                    line: 0,
                    column: 0,
                    message: format!(
                        "constraint '{label}': action field '{field}' is outside the closed set"
                    ),
                });
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("constraints.yaml")
    }

    #[test]
    fn clean_document_passes() {
        let yaml = concat!(
            "constraints:\n",
            "  - id: C-OK\n",
            "    title: Fine\n",
            "    actions:\n",
            "      risk_budget_multiplier: 1.5\n",
            "      stop_mode: TIGHTENED\n",
        );
        let report = validate_constraints_str(&path(), yaml).unwrap();
        assert!(report.passed());
    }

    #[test]
    fn unknown_action_field_is_reported_with_constraint_id() {
        let yaml = concat!(
            "constraints:\n",
            "  - id: C-SNEAKY\n",
            "    title: Smuggler\n",
            "    actions:\n",
            "      risk_budget_multiplier: 1.5\n",
            "      alpha_tilt: 0.4\n",
        );
        let report = validate_constraints_str(&path(), yaml).unwrap();
        assert_eq!(report.violations.len(), 1);
        let message = &report.violations[0].message;
        assert!(message.contains("C-SNEAKY"), "got: {message}");
        assert!(message.contains("alpha_tilt"), "got: {message}");
    }

    #[test]
    fn every_violation_is_listed() {
        let yaml = concat!(
            "constraints:\n",
            "  - id: C-ONE\n",
            "    actions:\n",
            "      bad_field_a: 1\n",
            "  - id: C-TWO\n",
            "    actions:\n",
            "      bad_field_b: 2\n",
            "      veto_downgrade: true\n",
        );
        let report = validate_constraints_str(&path(), yaml).unwrap();
        assert_eq!(report.violations.len(), 2);
    }

    #[test]
    fn constraint_without_actions_is_fine() {
        let yaml = concat!(
            "constraints:\n",
            "  - id: C-GUARDRAIL-ONLY\n",
            "    guardrails:\n",
            "      max_position_pct: 0.05\n",
        );
        let report = validate_constraints_str(&path(), yaml).unwrap();
        assert!(report.passed());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let err = validate_constraints_str(&path(), "constraints: [unterminated\n");
        assert!(err.is_err());
    }

    #[test]
    fn validate_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("constraints.yaml");
        std::fs::write(
            &file,
            "constraints:\n  - id: C-X\n    actions:\n      nope: 1\n",
        )
        .unwrap();
        let report = validate_constraints_file(&file).unwrap();
        assert_eq!(report.violations.len(), 1);
    }
}
