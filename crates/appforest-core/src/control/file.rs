//! Tree source backed by a JSON file on disk.

use std::path::{Path, PathBuf};

use crate::control::TreeSource;
use crate::error::TreeSourceError;
use crate::tree::{AppSnapshot, ApplicationTreeResponse};

/// Reads the application tree from a saved Jolokia response or a bare array.
#[derive(Debug, Clone)]
pub struct FileTreeSource {
    path: PathBuf,
}

impl FileTreeSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TreeSource for FileTreeSource {
    async fn fetch_tree(&self) -> Result<Vec<AppSnapshot>, TreeSourceError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| TreeSourceError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        parse_tree_payload(&content)
    }
}

/// Decode either `{"value": [...]}` or `[...]`.
pub fn parse_tree_payload(content: &str) -> Result<Vec<AppSnapshot>, TreeSourceError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if value.is_array() {
        return Ok(serde_json::from_value(value)?);
    }

    let response: ApplicationTreeResponse = serde_json::from_value(value)?;
    if response.status != 200 {
        return Err(TreeSourceError::Rejected {
            status: response.status,
            message: response.error.unwrap_or_default(),
        });
    }
    Ok(response.value)
}
