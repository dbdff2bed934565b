//! Project manifest (`package.json`).
//!
//! Only the project name is read; it names the remote sync destination.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ProjectManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), version: None }
    }

    /// Parse and validate manifest JSON.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let manifest: ProjectManifest = serde_json::from_str(contents)?;
        if manifest.name.trim().is_empty() {
            return Err(ConfigError::Validation(vec![
                "package.json: 'name' must be a non-empty string".to_string()
            ]));
        }
        Ok(manifest)
    }

    /// Destination name handed to the remote sync collaborator.
    pub fn sync_destination(&self) -> &str {
        &self.name
    }
}

/// Load the project manifest from `path`.
pub fn load_manifest(path: &Path) -> Result<ProjectManifest, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Manifest {
        path: path.to_path_buf(),
        source,
    })?;
    ProjectManifest::from_json(&contents)
}
