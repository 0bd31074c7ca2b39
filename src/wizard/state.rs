//! Step store
//!
//! Tracks the current step, which steps are completed and the payload
//! collected for each one. Navigation is guarded by reachability.

use crate::payload::StepPayload;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 1-based step number.
pub type StepId = u8;

/// Why a store operation was refused. The store is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error("step {step} is out of range (1..={step_count})")]
    OutOfRange { step: StepId, step_count: u8 },

    #[error("step {0} is not reachable yet")]
    NotAccessible(StepId),

    #[error("a wizard needs at least one step")]
    NoSteps,
}

/// Progress through a fixed set of steps `1..=step_count` plus the values
/// collected for each step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    step_count: u8,
    current_step: StepId,
    #[serde(default)]
    completed_steps: BTreeSet<StepId>,
    /// Kept for every visited step so going back shows what was entered.
    #[serde(default)]
    step_payloads: BTreeMap<StepId, StepPayload>,
}

impl WizardState {
    pub fn new(step_count: u8) -> Result<Self, StepError> {
        if step_count == 0 {
            return Err(StepError::NoSteps);
        }
        Ok(Self {
            step_count,
            current_step: 1,
            completed_steps: BTreeSet::new(),
            step_payloads: BTreeMap::new(),
        })
    }

    pub fn step_count(&self) -> u8 {
        self.step_count
    }

    pub fn current_step(&self) -> StepId {
        self.current_step
    }

    pub fn completed_steps(&self) -> &BTreeSet<StepId> {
        &self.completed_steps
    }

    pub fn payload(&self, step: StepId) -> Option<&StepPayload> {
        self.step_payloads.get(&step)
    }

    pub fn is_last_step(&self, step: StepId) -> bool {
        step == self.step_count
    }

    fn check_range(&self, step: StepId) -> Result<(), StepError> {
        if (1..=self.step_count).contains(&step) {
            Ok(())
        } else {
            Err(StepError::OutOfRange {
                step,
                step_count: self.step_count,
            })
        }
    }

    /// Navigation goes through the same reachability rule the step indicator
    /// uses, so the store never holds an unreachable current step.
    pub fn set_current_step(&mut self, step: StepId) -> Result<(), StepError> {
        self.check_range(step)?;
        if !self.is_step_accessible(step) {
            return Err(StepError::NotAccessible(step));
        }
        self.current_step = step;
        Ok(())
    }

    /// Idempotent. Returns whether the step was newly completed.
    pub fn mark_step_completed(&mut self, step: StepId) -> Result<bool, StepError> {
        self.check_range(step)?;
        Ok(self.completed_steps.insert(step))
    }

    /// Shallow-merges `partial` into the step's payload without validating it.
    pub fn update_step_payload(&mut self, step: StepId, partial: StepPayload) -> Result<(), StepError> {
        self.check_range(step)?;
        self.step_payloads.entry(step).or_default().merge(partial);
        Ok(())
    }

    pub fn max_completed(&self) -> Option<StepId> {
        self.completed_steps.last().copied()
    }

    /// Current, completed, or at most one past the furthest completed step.
    pub fn is_step_accessible(&self, step: StepId) -> bool {
        if !(1..=self.step_count).contains(&step) {
            return false;
        }
        let frontier = self.max_completed().unwrap_or(0).saturating_add(1);
        step == self.current_step || self.completed_steps.contains(&step) || step <= frontier
    }

    pub fn is_step_completed(&self, step: StepId) -> bool {
        self.completed_steps.contains(&step)
    }

    pub fn is_step_current(&self, step: StepId) -> bool {
        self.current_step == step
    }

    /// Smallest step after `step` that is not completed, or the last step.
    pub fn next_step_after(&self, step: StepId) -> StepId {
        ((step.saturating_add(1))..=self.step_count)
            .find(|s| !self.completed_steps.contains(s))
            .unwrap_or_else(|| step.saturating_add(1).min(self.step_count))
    }

    pub fn reset(&mut self) {
        self.current_step = 1;
        self.completed_steps.clear();
        self.step_payloads.clear();
    }

    /// Checks the range invariants, for states read back from disk.
    pub fn is_consistent(&self) -> bool {
        let in_range = |s: &StepId| (1..=self.step_count).contains(s);
        self.step_count > 0
            && in_range(&self.current_step)
            && self.completed_steps.iter().all(in_range)
            && self.step_payloads.keys().all(in_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reachable(state: &WizardState) -> Vec<StepId> {
        (1..=state.step_count())
            .filter(|s| state.is_step_accessible(*s))
            .collect()
    }

    #[test]
    fn fresh_wizard_only_reaches_first_step() {
        let state = WizardState::new(4).expect("state");
        assert_eq!(state.current_step(), 1);
        assert_eq!(reachable(&state), vec![1]);
    }

    #[test]
    fn completing_a_step_unlocks_the_next_one() {
        let mut state = WizardState::new(4).expect("state");
        state.mark_step_completed(1).expect("complete");
        assert_eq!(reachable(&state), vec![1, 2]);

        state.set_current_step(2).expect("navigate");
        state.mark_step_completed(2).expect("complete");
        assert_eq!(reachable(&state), vec![1, 2, 3]);
    }

    #[test]
    fn accessibility_matches_completed_current_and_frontier() {
        let mut state = WizardState::new(5).expect("state");
        state.mark_step_completed(1).expect("complete");
        state.mark_step_completed(2).expect("complete");
        state.set_current_step(2).expect("navigate");

        for step in 1..=5 {
            let frontier = state.max_completed().unwrap_or(0) + 1;
            let expected = state.completed_steps().contains(&step)
                || step == state.current_step()
                || step == frontier;
            assert_eq!(state.is_step_accessible(step), expected, "step {step}");
        }
        assert!(!state.is_step_accessible(0));
        assert!(!state.is_step_accessible(6));
    }

    #[test]
    fn gap_in_completed_steps_stays_reachable_below_the_frontier() {
        let mut state = WizardState::new(5).expect("state");
        state.mark_step_completed(3).expect("complete");

        assert_eq!(reachable(&state), vec![1, 2, 3, 4]);
        assert!(!state.is_step_completed(2));
        assert!(!state.is_step_accessible(5));
    }

    #[test]
    fn mark_step_completed_is_idempotent() {
        let mut once = WizardState::new(3).expect("state");
        once.mark_step_completed(2).expect("complete");

        let mut twice = WizardState::new(3).expect("state");
        assert!(twice.mark_step_completed(2).expect("complete"));
        assert!(!twice.mark_step_completed(2).expect("complete"));

        assert_eq!(once.completed_steps(), twice.completed_steps());
    }

    #[test]
    fn set_current_step_rejects_out_of_range_and_locked_steps() {
        let mut state = WizardState::new(3).expect("state");
        assert_eq!(
            state.set_current_step(4),
            Err(StepError::OutOfRange { step: 4, step_count: 3 })
        );
        assert_eq!(state.set_current_step(3), Err(StepError::NotAccessible(3)));
        assert_eq!(state.current_step(), 1);
    }

    #[test]
    fn update_step_payload_merges_shallowly() {
        let mut state = WizardState::new(2).expect("state");
        state
            .update_step_payload(1, StepPayload::new().with("businessName", "Acme").with("phone", "555"))
            .expect("update");
        state
            .update_step_payload(1, StepPayload::new().with("phone", "556"))
            .expect("update");

        let payload = state.payload(1).expect("payload");
        assert_eq!(payload.get("businessName").and_then(|v| v.as_str()), Some("Acme"));
        assert_eq!(payload.get("phone").and_then(|v| v.as_str()), Some("556"));
        assert!(state.update_step_payload(3, StepPayload::new()).is_err());
    }

    #[test]
    fn reset_clears_progress_and_payloads() {
        let mut state = WizardState::new(2).expect("state");
        state.update_step_payload(1, StepPayload::new().with("a", "b")).expect("update");
        state.mark_step_completed(1).expect("complete");
        state.set_current_step(2).expect("navigate");

        state.reset();
        assert_eq!(state, WizardState::new(2).expect("state"));
    }

    #[test]
    fn next_step_skips_completed_steps() {
        let mut state = WizardState::new(4).expect("state");
        state.mark_step_completed(1).expect("complete");
        state.mark_step_completed(2).expect("complete");
        assert_eq!(state.next_step_after(1), 3);
        assert_eq!(state.next_step_after(4), 4);
    }

    #[test]
    fn inconsistent_state_is_detected() {
        let json = r#"{ "stepCount": 2, "currentStep": 5, "completedSteps": [1] }"#;
        let state: WizardState = serde_json::from_str(json).expect("deserialize");
        assert!(!state.is_consistent());
        assert!(WizardState::new(0).is_err());
    }
}
