//! Factor registry operations.
//!
//! Factor computation is external. The registry's job is the failure-rule
//! gate (enforced at load) and enable/disable status tracking.

use crate::models::{Factor, FactorId, FactorStatus};

use super::snapshot::SharedRegistries;
use super::RegistryError;

impl SharedRegistries {
    /// Register a factor.
    ///
    /// Idempotent when the same name is registered with identical content;
    /// conflicting content under a reused name is an error.
    pub fn register_factor(&self, factor: Factor) -> Result<(), RegistryError> {
        self.publish(|snap| match snap.factors.get(&factor.name) {
            Some(existing) if *existing == factor => Ok(()),
            Some(_) => Err(RegistryError::Conflict {
                kind: "factor",
                id: factor.name.to_string(),
            }),
            None => {
                snap.factors.insert(factor.name.clone(), factor);
                Ok(())
            }
        })
    }

    /// Look up a factor by name.
    pub fn get_factor(&self, name: &FactorId) -> Result<Factor, RegistryError> {
        self.snapshot()
            .factors
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                kind: "factor",
                id: name.to_string(),
            })
    }

    /// List factors, optionally filtered by status.
    #[must_use]
    pub fn list_factors(&self, status: Option<FactorStatus>) -> Vec<Factor> {
        self.snapshot()
            .factors
            .values()
            .filter(|f| status.is_none_or(|s| f.status == s))
            .cloned()
            .collect()
    }

    /// Enable or disable a factor.
    pub fn set_factor_status(
        &self,
        name: &FactorId,
        status: FactorStatus,
    ) -> Result<(), RegistryError> {
        self.publish(|snap| {
            let factor = snap
                .factors
                .get_mut(name)
                .ok_or_else(|| RegistryError::NotFound {
                    kind: "factor",
                    id: name.to_string(),
                })?;
            if factor.status != status {
                tracing::info!(factor = %name, ?status, "Factor status change");
                factor.status = status;
            }
            Ok(())
        })
    }
}
