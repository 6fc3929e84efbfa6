//! Hypothesis registry operations.

use crate::models::{Actor, Hypothesis, HypothesisId, HypothesisStatus};

use super::snapshot::{GovernanceSnapshot, SharedRegistries};
use super::RegistryError;

impl SharedRegistries {
    /// Register a hypothesis.
    ///
    /// Idempotent when the same id is registered with identical content;
    /// conflicting content under a reused id is an error.
    pub fn register_hypothesis(&self, hypothesis: Hypothesis) -> Result<(), RegistryError> {
        self.publish(|snap| match snap.hypotheses.get(&hypothesis.id) {
            Some(existing) if *existing == hypothesis => Ok(()),
            Some(_) => Err(RegistryError::Conflict {
                kind: "hypothesis",
                id: hypothesis.id.to_string(),
            }),
            None => {
                snap.hypotheses.insert(hypothesis.id.clone(), hypothesis);
                Ok(())
            }
        })
    }

    /// Look up a hypothesis by id.
    pub fn get_hypothesis(&self, id: &HypothesisId) -> Result<Hypothesis, RegistryError> {
        self.snapshot()
            .hypotheses
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                kind: "hypothesis",
                id: id.to_string(),
            })
    }

    /// List hypotheses, optionally filtered by status.
    #[must_use]
    pub fn list_hypotheses(&self, status: Option<HypothesisStatus>) -> Vec<Hypothesis> {
        self.snapshot()
            .hypotheses
            .values()
            .filter(|h| status.is_none_or(|s| h.status == s))
            .cloned()
            .collect()
    }

    /// The explicit human approval that takes a hypothesis from DRAFT to
    /// ACTIVE. The engine can never perform this transition itself.
    ///
    /// Re-validates the non-empty-falsifier invariant: approval is the gate
    /// through which a hypothesis becomes reachable for ACTIVE status.
    pub fn approve_hypothesis(&self, id: &HypothesisId) -> Result<(), RegistryError> {
        self.publish(|snap| {
            let hypothesis =
                snap.hypotheses
                    .get_mut(id)
                    .ok_or_else(|| RegistryError::NotFound {
                        kind: "hypothesis",
                        id: id.to_string(),
                    })?;
            if hypothesis.falsifiers.is_empty() {
                return Err(RegistryError::MissingFalsifiers {
                    id: id.to_string(),
                });
            }
            transition(hypothesis, HypothesisStatus::Active, Actor::Human)
        })
    }

    /// Transition a hypothesis's status on behalf of an actor, enforcing the
    /// lifecycle table.
    pub fn transition_hypothesis(
        &self,
        id: &HypothesisId,
        to: HypothesisStatus,
        actor: Actor,
    ) -> Result<(), RegistryError> {
        self.publish(|snap| {
            let hypothesis =
                snap.hypotheses
                    .get_mut(id)
                    .ok_or_else(|| RegistryError::NotFound {
                        kind: "hypothesis",
                        id: id.to_string(),
                    })?;
            transition(hypothesis, to, actor)
        })
    }
}

fn transition(
    hypothesis: &mut Hypothesis,
    to: HypothesisStatus,
    actor: Actor,
) -> Result<(), RegistryError> {
    if !hypothesis.status.transition_allowed(to, actor) {
        return Err(RegistryError::InvalidTransition {
            id: hypothesis.id.to_string(),
            from: hypothesis.status,
            to,
            actor,
        });
    }
    tracing::info!(
        hypothesis_id = %hypothesis.id,
        from = %hypothesis.status,
        to = %to,
        ?actor,
        "Hypothesis status transition"
    );
    hypothesis.status = to;
    Ok(())
}

impl GovernanceSnapshot {
    /// ACTIVE hypotheses in id order.
    #[must_use]
    pub fn active_hypotheses(&self) -> Vec<&Hypothesis> {
        self.hypotheses
            .values()
            .filter(|h| h.status == HypothesisStatus::Active)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompareOp, Falsifier, TriggerAction};
    use chrono::Utc;

    fn sample_hypothesis(id: &str) -> Hypothesis {
        Hypothesis {
            id: HypothesisId::new(id),
            title: format!("{id} title"),
            statement: "statement".to_string(),
            scope: Default::default(),
            status: HypothesisStatus::Draft,
            review_cadence_days: 7,
            created_at: Utc::now(),
            evidence: vec![],
            falsifiers: vec![Falsifier {
                metric: "m".to_string(),
                op: CompareOp::Lt,
                threshold: 0.0,
                window_days: 30,
                trigger: TriggerAction::Sunset,
                cadence_days: None,
            }],
            constraints: vec![],
        }
    }

    #[test]
    fn register_is_idempotent_on_identical_content() {
        let registries = SharedRegistries::new();
        let h = sample_hypothesis("H-1");
        registries.register_hypothesis(h.clone()).unwrap();
        registries.register_hypothesis(h).unwrap();
        assert_eq!(registries.list_hypotheses(None).len(), 1);
    }

    #[test]
    fn register_conflicts_on_different_content() {
        let registries = SharedRegistries::new();
        registries
            .register_hypothesis(sample_hypothesis("H-1"))
            .unwrap();
        let mut changed = sample_hypothesis("H-1");
        changed.title = "different".to_string();
        let err = registries.register_hypothesis(changed).unwrap_err();
        assert!(matches!(err, RegistryError::Conflict { .. }));
    }

    #[test]
    fn approve_moves_draft_to_active() {
        let registries = SharedRegistries::new();
        registries
            .register_hypothesis(sample_hypothesis("H-1"))
            .unwrap();
        registries
            .approve_hypothesis(&HypothesisId::new("H-1"))
            .unwrap();
        let h = registries.get_hypothesis(&HypothesisId::new("H-1")).unwrap();
        assert_eq!(h.status, HypothesisStatus::Active);
    }

    #[test]
    fn approve_rejects_hypothesis_without_falsifiers() {
        let registries = SharedRegistries::new();
        let mut h = sample_hypothesis("H-NAKED");
        h.falsifiers.clear();
        registries.register_hypothesis(h).unwrap();
        let err = registries
            .approve_hypothesis(&HypothesisId::new("H-NAKED"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::MissingFalsifiers { .. }));
    }

    #[test]
    fn engine_cannot_activate_via_transition() {
        let registries = SharedRegistries::new();
        registries
            .register_hypothesis(sample_hypothesis("H-1"))
            .unwrap();
        let err = registries
            .transition_hypothesis(
                &HypothesisId::new("H-1"),
                HypothesisStatus::Active,
                Actor::Engine,
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTransition { .. }));
    }

    #[test]
    fn engine_can_sunset_active_hypothesis() {
        let registries = SharedRegistries::new();
        registries
            .register_hypothesis(sample_hypothesis("H-1"))
            .unwrap();
        registries
            .approve_hypothesis(&HypothesisId::new("H-1"))
            .unwrap();
        registries
            .transition_hypothesis(
                &HypothesisId::new("H-1"),
                HypothesisStatus::Sunset,
                Actor::Engine,
            )
            .unwrap();
        let h = registries.get_hypothesis(&HypothesisId::new("H-1")).unwrap();
        assert_eq!(h.status, HypothesisStatus::Sunset);
    }

    #[test]
    fn list_filters_by_status() {
        let registries = SharedRegistries::new();
        registries
            .register_hypothesis(sample_hypothesis("H-1"))
            .unwrap();
        registries
            .register_hypothesis(sample_hypothesis("H-2"))
            .unwrap();
        registries
            .approve_hypothesis(&HypothesisId::new("H-1"))
            .unwrap();

        assert_eq!(
            registries
                .list_hypotheses(Some(HypothesisStatus::Active))
                .len(),
            1
        );
        assert_eq!(
            registries
                .list_hypotheses(Some(HypothesisStatus::Draft))
                .len(),
            1
        );
        assert_eq!(registries.list_hypotheses(None).len(), 2);
    }
}
