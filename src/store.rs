//! Wizard draft persistence
//!
//! One pretty-printed JSON file per flow under the drafts directory
//! (`~/.property-portal/drafts/<flow>.json` by default), so an unfinished
//! wizard can be resumed.

use crate::config::ClientConfig;
use crate::wizard::state::{StepId, WizardState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;

/// Snapshot of an unfinished wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardDraft {
    pub flow_id: String,
    pub state: WizardState,
    /// Steps marked completed without reaching the server.
    #[serde(default)]
    pub skipped_steps: BTreeSet<StepId>,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid flow id for draft file: {0}")]
    InvalidFlowId(String),

    #[error("failed to serialize draft: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write draft {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct DraftStore {
    root: PathBuf,
}

impl DraftStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &ClientConfig) -> Option<Self> {
        config.resolved_drafts_dir().map(Self::new)
    }

    fn draft_path(&self, flow_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !flow_id.is_empty()
            && flow_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidFlowId(flow_id.to_string()));
        }
        Ok(self.root.join(format!("{flow_id}.json")))
    }

    /// A missing, unreadable or inconsistent draft reads as no draft.
    pub fn load(&self, flow_id: &str) -> Option<WizardDraft> {
        let path = self.draft_path(flow_id).ok()?;
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<WizardDraft>(&content) {
            Ok(draft) if draft.flow_id == flow_id && draft.state.is_consistent() => Some(draft),
            Ok(_) => {
                log::warn!("discarding inconsistent draft: {}", path.display());
                None
            }
            Err(err) => {
                log::warn!(
                    "failed to parse draft, starting fresh. path: {}, error: {}",
                    path.display(),
                    err
                );
                None
            }
        }
    }

    pub fn save(&self, draft: &WizardDraft) -> Result<(), StoreError> {
        let path = self.draft_path(&draft.flow_id)?;
        let io_err = |source| StoreError::Io {
            path: path.display().to_string(),
            source,
        };

        fs::create_dir_all(&self.root).map_err(io_err)?;
        let json = serde_json::to_string_pretty(draft)?;
        fs::write(&path, json).map_err(io_err)?;
        log::debug!("saved draft for {}", draft.flow_id);
        Ok(())
    }

    pub fn clear(&self, flow_id: &str) -> Result<(), StoreError> {
        let path = self.draft_path(flow_id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}
