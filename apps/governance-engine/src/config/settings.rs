//! Engine runtime settings.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::ConfigError;

/// Tunable runtime settings for the resolver cache and falsifier monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Resolver cache time-to-live in seconds.
    #[serde(default = "default_resolver_ttl_secs")]
    pub resolver_ttl_secs: u64,
    /// Whether the falsifier monitor runs.
    #[serde(default = "default_monitor_enabled")]
    pub monitor_enabled: bool,
    /// How often the monitor wakes to look for due checks, in seconds.
    #[serde(default = "default_monitor_tick_secs")]
    pub monitor_tick_secs: u64,
    /// Default falsifier evaluation cadence in days, used when neither the
    /// falsifier nor its hypothesis overrides it.
    #[serde(default = "default_monitor_cadence_days")]
    pub monitor_default_cadence_days: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            resolver_ttl_secs: default_resolver_ttl_secs(),
            monitor_enabled: default_monitor_enabled(),
            monitor_tick_secs: default_monitor_tick_secs(),
            monitor_default_cadence_days: default_monitor_cadence_days(),
        }
    }
}

const fn default_resolver_ttl_secs() -> u64 {
    30
}

const fn default_monitor_enabled() -> bool {
    true
}

const fn default_monitor_tick_secs() -> u64 {
    60
}

const fn default_monitor_cadence_days() -> u32 {
    1
}

/// Parse and validate the engine settings document.
///
/// # Errors
///
/// Returns `ConfigError` on YAML errors or zero-valued intervals.
pub fn parse_settings(file: &str, yaml: &str) -> Result<EngineSettings, ConfigError> {
    let settings: EngineSettings =
        serde_yaml_bw::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: file.to_string(),
            source: e,
        })?;

    if settings.resolver_ttl_secs == 0 {
        return Err(ValidationError::new(
            file,
            "resolver_ttl_secs",
            "cache TTL must be at least 1 second",
        )
        .into());
    }
    if settings.monitor_tick_secs == 0 {
        return Err(ValidationError::new(
            file,
            "monitor_tick_secs",
            "monitor tick must be at least 1 second",
        )
        .into());
    }
    if settings.monitor_default_cadence_days == 0 {
        return Err(ValidationError::new(
            file,
            "monitor_default_cadence_days",
            "default cadence must be at least 1 day",
        )
        .into());
    }

    Ok(settings)
}
