//! Single-file upload field for training material and exam documents.
//!
//! Files are never stored; accepting one yields a transient `blob:` reference.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::UploadConfig;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub reference: String,
    /// Set when the file is larger than the advisory limit; the upload is still accepted.
    pub exceeds_advisory_limit: bool,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("file name is required")]
    MissingFileName,
    #[error("file `{file_name}` is empty")]
    EmptyFile { file_name: String },
    #[error("file type `{mime_type}` is not accepted")]
    UnsupportedType { mime_type: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadPolicy {
    accepted_mime_types: Vec<String>,
    advisory_max_bytes: u64,
}

impl UploadPolicy {
    pub fn new(accepted_mime_types: Vec<String>, advisory_max_bytes: u64) -> Self {
        Self { accepted_mime_types, advisory_max_bytes }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.accepted_mime_types.clone(), config.advisory_max_bytes)
    }

    pub fn advisory_max_bytes(&self) -> u64 {
        self.advisory_max_bytes
    }

    /// Exact match, or `type/*` wildcard match, ignoring case and parameters.
    pub fn accepts(&self, mime_type: &str) -> bool {
        let essence = mime_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        let Some((top_level, _)) = essence.split_once('/') else {
            return false;
        };

        self.accepted_mime_types.iter().any(|accepted| {
            let accepted = accepted.trim().to_ascii_lowercase();
            match accepted.strip_suffix("/*") {
                Some(prefix) => prefix == top_level,
                None => accepted == essence,
            }
        })
    }

    pub fn accept(
        &self,
        file_name: &str,
        mime_type: &str,
        size_bytes: u64,
    ) -> Result<FileAttachment, UploadError> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(UploadError::MissingFileName);
        }
        if size_bytes == 0 {
            return Err(UploadError::EmptyFile { file_name: file_name.to_owned() });
        }
        if !self.accepts(mime_type) {
            return Err(UploadError::UnsupportedType { mime_type: mime_type.to_owned() });
        }

        Ok(FileAttachment {
            file_name: file_name.to_owned(),
            mime_type: mime_type.trim().to_owned(),
            size_bytes,
            reference: format!("blob:{}", Uuid::new_v4()),
            exceeds_advisory_limit: size_bytes > self.advisory_max_bytes,
        })
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}
