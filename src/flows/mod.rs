//! Wizard flows and their step definitions.

pub mod listing;
pub mod registry;
pub mod tenant;
pub mod vendor;

use crate::api::Endpoint;
use crate::schema::ValidationSchema;
use crate::transform::ApiShape;
use crate::wizard::state::StepId;
use serde::{Deserialize, Serialize};

/// Who a flow is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Tenant,
    Vendor,
}

/// Summary of a flow for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowManifest {
    /// Stable id, also used as the draft file name.
    pub id: String,
    pub display_name: String,
    pub role: Role,
    pub step_count: u8,
}

/// One step: what it collects, how it is checked and where it is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Machine name, e.g. `business_info`.
    pub key: String,
    /// Label shown in the step indicator.
    pub title: String,
    pub schema: ValidationSchema,
    pub endpoint: Endpoint,
    /// Key mapping applied to the payload before it is sent.
    #[serde(default)]
    pub api_shape: ApiShape,
    /// Whether the step may be marked completed without submitting it.
    #[serde(default)]
    pub skippable: bool,
}

impl StepDefinition {
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        endpoint: Endpoint,
        schema: ValidationSchema,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            schema,
            endpoint,
            api_shape: ApiShape::default(),
            skippable: false,
        }
    }

    pub fn with_shape(mut self, shape: ApiShape) -> Self {
        self.api_shape = shape;
        self
    }

    pub fn skippable(mut self) -> Self {
        self.skippable = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("unknown flow: {0}")]
    UnknownFlow(String),

    #[error("flow '{flow}' has no step {step}")]
    UnknownStep { flow: String, step: StepId },
}

/// A fixed, ordered list of steps. Step ids are 1-based positions.
pub trait Flow: Send + Sync {
    fn manifest(&self) -> &FlowManifest;

    fn steps(&self) -> &[StepDefinition];

    fn step(&self, id: StepId) -> Result<&StepDefinition, FlowError> {
        usize::from(id)
            .checked_sub(1)
            .and_then(|index| self.steps().get(index))
            .ok_or_else(|| FlowError::UnknownStep {
                flow: self.manifest().id.clone(),
                step: id,
            })
    }

    /// Step titles in order, for the indicator.
    fn titles(&self) -> Vec<&str> {
        self.steps().iter().map(|s| s.title.as_str()).collect()
    }
}

/// A flow described entirely by its manifest and ordered step list.
#[derive(Debug, Clone)]
pub struct DefinedFlow {
    manifest: FlowManifest,
    steps: Vec<StepDefinition>,
}

impl DefinedFlow {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
        steps: Vec<StepDefinition>,
    ) -> Self {
        Self {
            manifest: FlowManifest {
                id: id.into(),
                display_name: display_name.into(),
                role,
                step_count: u8::try_from(steps.len()).unwrap_or(u8::MAX),
            },
            steps,
        }
    }
}

impl Flow for DefinedFlow {
    fn manifest(&self) -> &FlowManifest {
        &self.manifest
    }

    fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }
}
