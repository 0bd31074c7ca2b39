//! Step indicator view model.

use super::state::{StepId, WizardState};
use serde::Serialize;

/// How a step is drawn. `Current` wins over `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Current,
    Completed,
    Available,
    Locked,
}

/// One numbered circle of the step indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepBadge {
    pub step: StepId,
    pub title: String,
    pub status: StepStatus,
    pub completed: bool,
    /// Reachable and not already current.
    pub clickable: bool,
    /// Whether the line leading to the next circle is drawn as done. `None`
    /// for the last step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_filled: Option<bool>,
}

/// Derives the indicator purely from the store; holds no state of its own.
pub fn build_indicator(state: &WizardState, titles: &[&str]) -> Vec<StepBadge> {
    (1..=state.step_count())
        .map(|step| {
            let completed = state.is_step_completed(step);
            let accessible = state.is_step_accessible(step);
            let status = if state.is_step_current(step) {
                StepStatus::Current
            } else if completed {
                StepStatus::Completed
            } else if accessible {
                StepStatus::Available
            } else {
                StepStatus::Locked
            };

            StepBadge {
                step,
                title: titles
                    .get(usize::from(step) - 1)
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| format!("Step {step}")),
                status,
                completed,
                clickable: accessible && !state.is_step_current(step),
                connector_filled: (!state.is_last_step(step)).then_some(completed),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_reflects_progress() {
        let mut state = WizardState::new(4).expect("state");
        state.mark_step_completed(1).expect("complete");
        state.set_current_step(2).expect("navigate");

        let badges = build_indicator(&state, &["Business", "Services", "Availability", "KYC"]);
        let statuses: Vec<StepStatus> = badges.iter().map(|b| b.status).collect();
        assert_eq!(
            statuses,
            vec![
                StepStatus::Completed,
                StepStatus::Current,
                StepStatus::Locked,
                StepStatus::Locked
            ]
        );
        assert!(badges[0].clickable);
        assert!(!badges[1].clickable);
        assert!(!badges[2].clickable);
        assert_eq!(badges[0].connector_filled, Some(true));
        assert_eq!(badges[1].connector_filled, Some(false));
        assert_eq!(badges[3].connector_filled, None);
        assert_eq!(badges[2].title, "Availability");
    }

    #[test]
    fn revisiting_a_completed_step_shows_it_as_current() {
        let mut state = WizardState::new(3).expect("state");
        state.mark_step_completed(1).expect("complete");
        state.mark_step_completed(2).expect("complete");
        state.set_current_step(1).expect("navigate");

        let badges = build_indicator(&state, &[]);
        assert_eq!(badges[0].status, StepStatus::Current);
        assert!(badges[0].completed);
        assert_eq!(badges[2].status, StepStatus::Available);
        assert_eq!(badges[2].title, "Step 3");
    }
}
