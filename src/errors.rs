//! Errors returned to the frontend
//!
//! Every module error converts into [`AppError`], which serializes with a
//! snake_case `kind` and camelCase keys.

use crate::api::ApiError;
use crate::flows::FlowError;
use crate::schema::ValidationErrors;
use crate::store::StoreError;
use crate::upload::FileError;
use crate::wizard::state::StepError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Broad category the frontend switches on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unknown,
    /// One or more fields failed their schema.
    Validation,
    /// A picked file is too large or of the wrong type.
    FileConstraint,
    /// Target step is out of range or not reachable yet.
    Navigation,
    /// The request never got a response.
    Network,
    /// The server answered with an error or `success: false`.
    Api,
    /// Draft files could not be written.
    Storage,
}

/// Error shape handed to the frontend. Field errors are shown inline; the
/// rest go to a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct AppError {
    pub kind: ErrorKind,
    /// User-facing text.
    pub message: String,
    /// Technical detail for logs or an expandable panel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Stable machine-readable code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Field path → message, for inline display.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub field_errors: BTreeMap<String, String>,
}

impl AppError {
    fn new(kind: ErrorKind, message: impl Into<String>, code: &str) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            code: Some(code.to_string()),
            field_errors: BTreeMap::new(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            message: message.into(),
            details: None,
            code: None,
            field_errors: BTreeMap::new(),
        }
    }

    pub fn unknown_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::unknown(message)
        }
    }

    /// Whether the user can fix this by editing the form rather than retrying.
    pub fn is_inline(&self) -> bool {
        matches!(self.kind, ErrorKind::Validation | ErrorKind::FileConstraint)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        Self {
            field_errors: err.into_map(),
            ..Self::new(
                ErrorKind::Validation,
                "Please fix the highlighted fields",
                "validation_failed",
            )
        }
    }
}

impl From<FileError> for AppError {
    fn from(err: FileError) -> Self {
        Self::new(ErrorKind::FileConstraint, err.to_string(), "file_constraint")
    }
}

impl From<StepError> for AppError {
    fn from(err: StepError) -> Self {
        let code = match err {
            StepError::OutOfRange { .. } => "step_out_of_range",
            StepError::NotAccessible(_) => "step_not_accessible",
            StepError::NoSteps => "no_steps",
        };
        Self::new(ErrorKind::Navigation, err.to_string(), code)
    }
}

impl From<FlowError> for AppError {
    fn from(err: FlowError) -> Self {
        let code = match err {
            FlowError::UnknownFlow(_) => "unknown_flow",
            FlowError::UnknownStep { .. } => "unknown_step",
        };
        Self::new(ErrorKind::Unknown, err.to_string(), code)
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport(msg) => Self {
                details: Some(msg),
                ..Self::new(
                    ErrorKind::Network,
                    "Network error, please try again",
                    "network_error",
                )
            },
            ApiError::Status { status, message } => Self {
                details: Some(format!("status {status}")),
                ..Self::new(ErrorKind::Api, message, "api_status")
            },
            ApiError::Rejected(msg) => Self::new(ErrorKind::Api, msg, "api_rejected"),
            ApiError::InvalidResponse(msg) => Self {
                details: Some(msg),
                ..Self::new(
                    ErrorKind::Api,
                    "Unexpected response from server",
                    "invalid_response",
                )
            },
            ApiError::InvalidUrl(msg) => Self::new(ErrorKind::Unknown, msg, "invalid_url"),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::new(ErrorKind::Storage, err.to_string(), "draft_storage")
    }
}
