//! Upload limits and file inspection
//!
//! Size is checked before type, and both before anything is sent.

use crate::payload::FileRef;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const MB: u64 = 1024 * 1024;

pub const IMAGE_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Client-side limits for an upload field, checked before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConstraints {
    pub accepted_mime_types: Vec<String>,
    /// Inclusive upper bound in bytes.
    pub max_bytes: u64,
}

impl FileConstraints {
    pub fn images(max_mb: u64) -> Self {
        Self {
            accepted_mime_types: IMAGE_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            max_bytes: max_mb * MB,
        }
    }

    pub fn images_and_pdf(max_mb: u64) -> Self {
        let mut constraints = Self::images(max_mb);
        constraints.accepted_mime_types.push(PDF_MIME_TYPE.to_string());
        constraints
    }

    fn accepts(&self, mime_type: &str) -> bool {
        self.accepted_mime_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(mime_type))
    }

    fn describe_accepted(&self) -> String {
        let mut labels: Vec<&str> = Vec::new();
        for mime in &self.accepted_mime_types {
            let label = match mime.as_str() {
                "image/jpeg" | "image/jpg" => "JPG",
                "image/png" => "PNG",
                PDF_MIME_TYPE => "PDF",
                other => other,
            };
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileError {
    #[error("File size must be less than {limit_mb}MB")]
    TooLarge { size: u64, limit_mb: u64 },

    #[error("Only {accepted} files are allowed")]
    UnsupportedType { mime_type: String, accepted: String },

    #[error("File is empty")]
    Empty,
}

/// Size is checked first so an oversized file is reported as such whatever
/// its type.
pub fn validate_file(file: &FileRef, constraints: &FileConstraints) -> Result<(), FileError> {
    if file.size > constraints.max_bytes {
        return Err(FileError::TooLarge {
            size: file.size,
            limit_mb: constraints.max_bytes.div_ceil(MB),
        });
    }
    if file.size == 0 {
        return Err(FileError::Empty);
    }
    if !constraints.accepts(&file.mime_type) {
        return Err(FileError::UnsupportedType {
            mime_type: file.mime_type.clone(),
            accepted: constraints.describe_accepted(),
        });
    }
    Ok(())
}

pub fn mime_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "pdf" => Some(PDF_MIME_TYPE),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Reads a picked file off the async runtime and returns its metadata with a
/// SHA-256 fingerprint.
pub async fn inspect_file(path: &Path) -> Result<FileRef> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || inspect_file_sync(&path))
        .await
        .context("failed to join file inspection task")?
}

fn inspect_file_sync(path: &Path) -> Result<FileRef> {
    if !path.is_file() {
        return Err(anyhow!("not a file: {}", path.display()));
    }

    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("file name is not valid UTF-8: {}", path.display()))?
        .to_string();

    let mut file =
        File::open(path).with_context(|| format!("failed to open file: {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 8192];
    let mut size = 0_u64;
    loop {
        let read = file
            .read(&mut buffer)
            .with_context(|| format!("failed to read file: {}", path.display()))?;
        if read == 0 {
            break;
        }
        size += read as u64;
        hasher.update(&buffer[..read]);
    }

    Ok(FileRef {
        name,
        mime_type: mime_type_for_path(path)
            .unwrap_or("application/octet-stream")
            .to_string(),
        size,
        sha256: Some(hex::encode(hasher.finalize())),
        path: Some(path.to_string_lossy().to_string()),
    })
}
