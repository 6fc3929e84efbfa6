//! Tracing setup.
//!
//! Console-structured logging with `RUST_LOG`-style filtering.
//!
//! # Usage
//!
//! ```rust,ignore
//! use governance_engine::telemetry::init_telemetry;
//!
//! fn main() {
//!     init_telemetry();
//!     // ... application code
//! }
//! ```

use tracing_subscriber::EnvFilter;

/// Initialize console tracing.
///
/// Filtering defaults to `info` and honors `RUST_LOG`. Safe to call once at
/// process start; subsequent calls are ignored.
pub fn init_telemetry() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_telemetry();
        init_telemetry();
    }
}
