//! Crate-level error taxonomy.
//!
//! Components define their own error enums next to their code; this module
//! holds the shared [`ValidationError`] (configuration and gate checks both
//! produce it) and the top-level [`GovernanceError`] the engine facade
//! returns.

use thiserror::Error;

/// A configuration document failed validation.
///
/// Always names the offending file and field. Fatal at load time; nothing
/// is partially applied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("validation failed in '{file}', field '{field}': {message}")]
pub struct ValidationError {
    /// The document the violation was found in.
    pub file: String,
    /// Dotted path to the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    /// Create a validation error.
    #[must_use]
    pub fn new(
        file: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Top-level error for engine construction and operations.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// Configuration loading or validation failed.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// A registry operation failed.
    #[error(transparent)]
    Registry(#[from] crate::registry::RegistryError),

    /// Pool construction produced an empty symbol set.
    #[error(transparent)]
    EmptyPool(#[from] crate::pool::EmptyPoolError),

    /// The audit store rejected a write.
    #[error(transparent)]
    Audit(#[from] crate::audit::AuditError),
}
