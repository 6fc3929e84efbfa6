//! Structured alerts handed to an external delivery mechanism.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::{ConstraintId, HypothesisId};

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    /// Informational.
    Info,
    /// Needs attention soon.
    Warning,
    /// Needs attention now.
    Critical,
}

/// Delivery channel requested for an alert. Delivery itself is external.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertChannel {
    /// Structured log output.
    Log,
    /// Email delivery.
    Email,
    /// Webhook delivery.
    Webhook,
}

/// A structured alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert id.
    pub id: String,
    /// When the alert was generated.
    pub timestamp: DateTime<Utc>,
    /// Severity.
    pub severity: AlertSeverity,
    /// Short title.
    pub title: String,
    /// Full message.
    pub message: String,
    /// Hypothesis involved, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypothesis_id: Option<HypothesisId>,
    /// Constraint involved, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_id: Option<ConstraintId>,
    /// What a human should do about it.
    pub recommended_action: String,
    /// Requested delivery channels.
    pub channels: Vec<AlertChannel>,
}

impl Alert {
    /// Create an alert with a generated id, stamped now.
    #[must_use]
    pub fn new(
        severity: AlertSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            severity,
            title: title.into(),
            message: message.into(),
            hypothesis_id: None,
            constraint_id: None,
            recommended_action: String::new(),
            channels: vec![AlertChannel::Log],
        }
    }

    /// Attach a hypothesis reference.
    #[must_use]
    pub fn with_hypothesis(mut self, id: HypothesisId) -> Self {
        self.hypothesis_id = Some(id);
        self
    }

    /// Attach a constraint reference.
    #[must_use]
    pub fn with_constraint(mut self, id: ConstraintId) -> Self {
        self.constraint_id = Some(id);
        self
    }

    /// Set the recommended action.
    #[must_use]
    pub fn with_recommended_action(mut self, action: impl Into<String>) -> Self {
        self.recommended_action = action.into();
        self
    }

    /// Set the requested delivery channels.
    #[must_use]
    pub fn with_channels(mut self, channels: Vec<AlertChannel>) -> Self {
        self.channels = channels;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alerts_get_unique_ids() {
        let a = Alert::new(AlertSeverity::Info, "a", "first");
        let b = Alert::new(AlertSeverity::Info, "b", "second");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn severity_orders_by_urgency() {
        assert!(AlertSeverity::Info < AlertSeverity::Warning);
        assert!(AlertSeverity::Warning < AlertSeverity::Critical);
    }
}
