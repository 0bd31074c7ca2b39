//! Entry points called by the frontend.

use crate::api::HttpPersistence;
use crate::config::ClientConfig;
use crate::errors::AppError;
use crate::flows::registry::FlowRegistry;
use crate::flows::FlowManifest;
use crate::payload::FileRef;
use crate::schema::{Rule, ValidationSchema};
use crate::store::DraftStore;
use crate::upload::{inspect_file, validate_file};
use crate::wizard::{StepId, WizardController};
use std::path::Path;
use std::sync::Arc;

pub fn list_flows() -> Vec<FlowManifest> {
    FlowRegistry::new().manifests()
}

pub fn get_step_schema(flow_id: &str, step: StepId) -> Result<ValidationSchema, AppError> {
    let registry = FlowRegistry::new();
    let flow = registry.get(flow_id)?;
    let schema = flow.step(step)?.schema.clone();
    Ok(schema)
}

/// Opens a wizard against the configured API, resuming a saved draft when
/// there is one.
pub fn open_wizard(flow_id: &str, config: &ClientConfig) -> Result<WizardController, AppError> {
    let flow = FlowRegistry::new().get(flow_id)?;
    let persistence = HttpPersistence::new(config)?;
    let controller = WizardController::new(flow, Arc::new(persistence))?;
    Ok(match DraftStore::from_config(config) {
        Some(drafts) => controller.with_drafts(drafts),
        None => {
            log::warn!("no drafts directory available, {} will not be resumable", flow_id);
            controller
        }
    })
}

/// Reads a picked file and checks it against the upload limits of `field`,
/// so a bad file is reported under the field before anything is sent.
pub async fn inspect_upload(
    path: &Path,
    flow_id: &str,
    step: StepId,
    field: &str,
) -> Result<FileRef, AppError> {
    let schema = get_step_schema(flow_id, step)?;
    let field_schema = schema
        .fields
        .get(field)
        .ok_or_else(|| AppError::unknown_with_code(format!("unknown field: {field}"), "unknown_field"))?;

    let file = inspect_file(path).await.map_err(|e| {
        AppError::unknown_with_code(format!("failed to read file: {e:#}"), "file_read_failed")
    })?;

    for rule in &field_schema.rules {
        if let Rule::File { constraints } = rule {
            validate_file(&file, constraints).map_err(|e| {
                let mut err = AppError::from(e);
                err.field_errors.insert(field.to_string(), err.message.clone());
                err
            })?;
        }
    }
    Ok(file)
}
