//! Wizard engine for property owner, tenant and vendor onboarding.

pub mod api;
pub mod availability;
pub mod commands;
pub mod config;
pub mod errors;
pub mod flows;
pub mod payload;
pub mod schema;
pub mod store;
pub mod transform;
pub mod upload;
pub mod wizard;

pub use errors::{AppError, ErrorKind};
pub use payload::{FieldValue, FileRef, StepPayload};
pub use schema::{ValidationErrors, ValidationSchema, Validator};
pub use wizard::{SubmitOutcome, WizardController, WizardState};
