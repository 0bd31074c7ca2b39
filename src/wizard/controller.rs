//! Wizard controller
//!
//! Ties a flow to its store, validates on submit and only advances once the
//! persistence boundary accepted the step.

use super::indicator::{build_indicator, StepBadge};
use super::state::{StepId, WizardState};
use crate::api::{check_response, StepPersistence, StepRequest};
use crate::errors::AppError;
use crate::flows::{Flow, StepDefinition};
use crate::payload::StepPayload;
use crate::schema::{ValidationErrors, Validator};
use crate::store::{DraftStore, WizardDraft};
use crate::transform::to_api_body;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Advanced {
        completed: StepId,
        next: StepId,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    /// The last step went through; the store has been reset.
    Finished {
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
}

/// Drives one flow: collects step payloads, validates on submit, persists
/// through the boundary and only then advances.
pub struct WizardController {
    flow: Arc<dyn Flow>,
    state: WizardState,
    skipped_steps: BTreeSet<StepId>,
    persistence: Arc<dyn StepPersistence>,
    drafts: Option<DraftStore>,
}

impl WizardController {
    pub fn new(flow: Arc<dyn Flow>, persistence: Arc<dyn StepPersistence>) -> Result<Self, AppError> {
        let state = WizardState::new(flow.manifest().step_count)?;
        Ok(Self {
            flow,
            state,
            skipped_steps: BTreeSet::new(),
            persistence,
            drafts: None,
        })
    }

    /// Enables draft autosave and resumes from a saved draft when one exists.
    pub fn with_drafts(mut self, drafts: DraftStore) -> Self {
        let flow_id = self.flow.manifest().id.clone();
        if let Some(draft) = drafts.load(&flow_id) {
            if draft.state.step_count() == self.state.step_count() {
                log::info!(
                    "resuming {} at step {}",
                    flow_id,
                    draft.state.current_step()
                );
                self.state = draft.state;
                self.skipped_steps = draft.skipped_steps;
            } else {
                log::warn!("draft for {} has a different step count, ignoring it", flow_id);
            }
        }
        self.drafts = Some(drafts);
        self
    }

    pub fn flow(&self) -> &dyn Flow {
        self.flow.as_ref()
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// Steps completed locally without a server round trip.
    pub fn skipped_steps(&self) -> &BTreeSet<StepId> {
        &self.skipped_steps
    }

    pub fn current_definition(&self) -> Result<&StepDefinition, AppError> {
        Ok(self.flow.step(self.state.current_step())?)
    }

    pub fn indicator(&self) -> Vec<StepBadge> {
        build_indicator(&self.state, &self.flow.titles())
    }

    pub fn update_current(&mut self, partial: StepPayload) -> Result<(), AppError> {
        let step = self.state.current_step();
        self.state.update_step_payload(step, partial)?;
        self.save_draft();
        Ok(())
    }

    pub fn validate_current(&self) -> Result<(), ValidationErrors> {
        let step = self.state.current_step();
        let Ok(definition) = self.flow.step(step) else {
            return Ok(());
        };
        let empty = StepPayload::new();
        let payload = self.state.payload(step).unwrap_or(&empty);
        definition.schema.validate(payload)
    }

    pub fn go_to(&mut self, step: StepId) -> Result<(), AppError> {
        self.state.set_current_step(step)?;
        self.save_draft();
        Ok(())
    }

    pub fn go_back(&mut self) -> Result<(), AppError> {
        let current = self.state.current_step();
        if current > 1 {
            self.go_to(current - 1)?;
        }
        Ok(())
    }

    /// Validates the current step, sends it, and advances only after the
    /// server accepted it. On any failure the payload and position are kept
    /// so the user can retry.
    pub async fn submit_current(&mut self) -> Result<SubmitOutcome, AppError> {
        let flow = Arc::clone(&self.flow);
        let step = self.state.current_step();
        let definition = flow.step(step)?;

        self.validate_current()?;

        let empty = StepPayload::new();
        let payload = self.state.payload(step).unwrap_or(&empty);
        let request = StepRequest {
            endpoint: definition.endpoint.clone(),
            body: to_api_body(payload, &definition.api_shape),
        };

        log::info!(
            "submitting {} step {} ({})",
            flow.manifest().id,
            step,
            definition.key
        );
        let response = match self
            .persistence
            .persist(&request)
            .await
            .and_then(check_response)
        {
            Ok(response) => response,
            Err(err) => {
                log::warn!(
                    "{} step {} was not saved: {}",
                    flow.manifest().id,
                    step,
                    err
                );
                return Err(err.into());
            }
        };

        self.state.mark_step_completed(step)?;
        self.skipped_steps.remove(&step);
        self.advance_from(step, response.data)
    }

    /// Marks a skippable step completed without calling the server. The step
    /// stays in [`WizardController::skipped_steps`] until it is submitted.
    /// Skipping a step that was already saved just moves on.
    pub fn skip_current(&mut self) -> Result<SubmitOutcome, AppError> {
        let step = self.state.current_step();
        let definition = self.flow.step(step)?;
        if !definition.skippable {
            return Err(AppError::unknown_with_code(
                format!("{} cannot be skipped", definition.title),
                "step_not_skippable",
            ));
        }

        // A step the server already accepted keeps its saved data.
        if self.state.is_step_completed(step) && !self.skipped_steps.contains(&step) {
            log::info!(
                "{} step {} was already saved, moving on",
                self.flow.manifest().id,
                step
            );
            return self.advance_from(step, None);
        }

        log::warn!(
            "skipping {} step {} without saving it",
            self.flow.manifest().id,
            step
        );
        self.state.mark_step_completed(step)?;
        self.skipped_steps.insert(step);
        self.advance_from(step, None)
    }

    fn advance_from(&mut self, step: StepId, data: Option<Value>) -> Result<SubmitOutcome, AppError> {
        if self.state.is_last_step(step) {
            self.finish();
            return Ok(SubmitOutcome::Finished { data });
        }

        let next = self.state.next_step_after(step);
        self.state.set_current_step(next)?;
        self.save_draft();
        Ok(SubmitOutcome::Advanced {
            completed: step,
            next,
            data,
        })
    }

    fn finish(&mut self) {
        log::info!("{} finished", self.flow.manifest().id);
        self.state.reset();
        self.skipped_steps.clear();
        if let Some(drafts) = &self.drafts {
            if let Err(err) = drafts.clear(&self.flow.manifest().id) {
                log::warn!("failed to clear draft: {}", err);
            }
        }
    }

    /// Draft failures never block the wizard.
    fn save_draft(&self) {
        let Some(drafts) = &self.drafts else {
            return;
        };
        let draft = WizardDraft {
            flow_id: self.flow.manifest().id.clone(),
            state: self.state.clone(),
            skipped_steps: self.skipped_steps.clone(),
            saved_at: Utc::now(),
        };
        if let Err(err) = drafts.save(&draft) {
            log::warn!("failed to save draft: {}", err);
        }
    }
}
