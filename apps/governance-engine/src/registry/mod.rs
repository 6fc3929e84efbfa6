//! Registries for hypotheses, constraints, and factors.
//!
//! All entity state lives in a versioned, immutable [`GovernanceSnapshot`].
//! Readers clone an `Arc` to the current snapshot and work against it for
//! the duration of one resolution; writers rebuild the snapshot and publish
//! it atomically, so concurrent readers see either the pre- or post-update
//! state, never a partial one.

mod constraint;
mod factor;
mod hypothesis;
mod snapshot;

use thiserror::Error;

pub use snapshot::{GovernanceSnapshot, SharedRegistries};

/// Registry operation errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An identifier was reused with different content.
    #[error("{kind} '{id}' already registered with different content")]
    Conflict {
        /// Entity kind ("hypothesis", "constraint", "factor").
        kind: &'static str,
        /// The conflicting identifier.
        id: String,
    },

    /// Lookup for a missing entity.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// Entity kind.
        kind: &'static str,
        /// The missing identifier.
        id: String,
    },

    /// A status transition violated the lifecycle rules.
    #[error("hypothesis '{id}': transition {from} -> {to} not permitted for {actor:?}")]
    InvalidTransition {
        /// Hypothesis id.
        id: String,
        /// Current status.
        from: crate::models::HypothesisStatus,
        /// Requested status.
        to: crate::models::HypothesisStatus,
        /// Who requested it.
        actor: crate::models::Actor,
    },

    /// Approval attempted on a hypothesis with no falsifiers.
    #[error("hypothesis '{id}' cannot be approved without falsifiers")]
    MissingFalsifiers {
        /// Hypothesis id.
        id: String,
    },
}
