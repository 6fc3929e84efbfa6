//! Alert dispatch port.
//!
//! The engine generates structured [`Alert`] objects; delivery transport
//! (email, webhook) is external. The in-tree sink writes them to the
//! structured log.

use crate::models::{Alert, AlertSeverity};

/// Outbound alert port.
pub trait AlertSink: Send + Sync {
    /// Hand an alert to the delivery mechanism.
    fn dispatch(&self, alert: &Alert);
}

/// Alert sink that emits alerts as structured log events.
#[derive(Debug, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn dispatch(&self, alert: &Alert) {
        match alert.severity {
            AlertSeverity::Info => tracing::info!(
                alert_id = %alert.id,
                title = %alert.title,
                message = %alert.message,
                recommended_action = %alert.recommended_action,
                "Alert"
            ),
            AlertSeverity::Warning => tracing::warn!(
                alert_id = %alert.id,
                title = %alert.title,
                message = %alert.message,
                recommended_action = %alert.recommended_action,
                "Alert"
            ),
            AlertSeverity::Critical => tracing::error!(
                alert_id = %alert.id,
                title = %alert.title,
                message = %alert.message,
                recommended_action = %alert.recommended_action,
                "Alert"
            ),
        }
    }
}
