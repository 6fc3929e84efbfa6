//! Constraint registry operations and activation evaluation.

use crate::models::{Constraint, ConstraintId, HypothesisStatus, Symbol};

use super::snapshot::{GovernanceSnapshot, SharedRegistries};
use super::RegistryError;

impl SharedRegistries {
    /// Register a constraint.
    ///
    /// Idempotent when the same id is registered with identical content;
    /// conflicting content under a reused id is an error.
    pub fn register_constraint(&self, constraint: Constraint) -> Result<(), RegistryError> {
        self.publish(|snap| match snap.constraints.get(&constraint.id) {
            Some(existing) if *existing == constraint => Ok(()),
            Some(_) => Err(RegistryError::Conflict {
                kind: "constraint",
                id: constraint.id.to_string(),
            }),
            None => {
                snap.constraints.insert(constraint.id.clone(), constraint);
                Ok(())
            }
        })
    }

    /// Look up a constraint by id.
    pub fn get_constraint(&self, id: &ConstraintId) -> Result<Constraint, RegistryError> {
        self.snapshot()
            .constraints
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                kind: "constraint",
                id: id.to_string(),
            })
    }

    /// List constraints applicable to a symbol (active or not).
    #[must_use]
    pub fn list_constraints_for_symbol(&self, symbol: &Symbol) -> Vec<Constraint> {
        self.snapshot()
            .constraints
            .values()
            .filter(|c| c.applicability.applies_to_symbol(symbol))
            .cloned()
            .collect()
    }
}

impl GovernanceSnapshot {
    /// Whether a constraint's activation rule is currently satisfied.
    ///
    /// Pure function of this snapshot, recomputed on demand: hypothesis
    /// status changes independently of the constraint object, so activation
    /// is never cached inside it. A reference to an unknown hypothesis fails
    /// closed (inactive) with a warning.
    #[must_use]
    pub fn constraint_is_active(&self, constraint: &Constraint) -> bool {
        let mut active = true;
        for hypothesis_id in &constraint.activation.hypotheses {
            match self.hypotheses.get(hypothesis_id) {
                Some(h) => {
                    if h.status != HypothesisStatus::Active {
                        active = false;
                    }
                }
                None => {
                    tracing::warn!(
                        constraint_id = %constraint.id,
                        hypothesis_id = %hypothesis_id,
                        "Activation rule references unknown hypothesis; failing closed"
                    );
                    active = false;
                }
            }
        }
        active
    }

    /// Active constraints applicable to a symbol, in deterministic
    /// (priority, id) order.
    #[must_use]
    pub fn active_constraints_for_symbol(&self, symbol: &Symbol) -> Vec<&Constraint> {
        let mut constraints: Vec<&Constraint> = self
            .constraints
            .values()
            .filter(|c| c.applicability.applies_to_symbol(symbol))
            .filter(|c| self.constraint_is_active(c))
            .collect();
        constraints.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        constraints
    }

    /// Ids of all currently active constraints, in id order.
    #[must_use]
    pub fn active_constraint_ids(&self) -> Vec<ConstraintId> {
        self.constraints
            .values()
            .filter(|c| self.constraint_is_active(c))
            .map(|c| c.id.clone())
            .collect()
    }
}
