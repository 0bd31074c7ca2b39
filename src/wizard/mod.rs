//! Step store, step indicator and the controller that drives a flow.

pub mod controller;
pub mod indicator;
pub mod state;

pub use controller::{SubmitOutcome, WizardController};
pub use indicator::{build_indicator, StepBadge, StepStatus};
pub use state::{StepError, StepId, WizardState};
