//! Directory-backed artifact enumeration.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use super::name::{ArtifactName, ArtifactNameError};
use crate::ports::CoreError;

/// File-name suffix that marks a file as an artifact.
pub const ARTIFACT_SUFFIX: &str = ".llamafile";

/// Enumerates and checks artifacts in a single, non-recursive directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store over `root`. The directory is not touched until queried.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The artifacts directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path an artifact with this name lives at.
    pub fn path_for(&self, name: &ArtifactName) -> PathBuf {
        self.root.join(name.as_str())
    }

    /// Whether `name` follows the artifact naming convention.
    pub fn accepts(&self, name: &ArtifactName) -> bool {
        name.as_str().ends_with(ARTIFACT_SUFFIX) && name.as_str().len() > ARTIFACT_SUFFIX.len()
    }

    /// Check the naming convention, returning a descriptive error.
    pub fn require_accepted(&self, name: &ArtifactName) -> Result<(), ArtifactNameError> {
        if self.accepts(name) {
            Ok(())
        } else {
            Err(ArtifactNameError::MissingSuffix {
                name: name.to_string(),
                suffix: ARTIFACT_SUFFIX.to_string(),
            })
        }
    }

    /// List artifact names currently in the directory, sorted.
    ///
    /// Only regular files (after following symlinks) with the artifact
    /// suffix are returned. Names that are not valid UTF-8 are skipped.
    pub async fn list(&self) -> Result<Vec<String>, CoreError> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| self.unavailable(&e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| self.unavailable(&e))? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !name.ends_with(ARTIFACT_SUFFIX) {
                continue;
            }
            // Follows symlinks; dangling links and directories are not artifacts.
            match fs::metadata(entry.path()).await {
                Ok(meta) if meta.is_file() => names.push(name),
                Ok(_) => {}
                Err(e) => debug!(entry = %name, error = %e, "Skipping unreadable entry"),
            }
        }

        names.sort();
        Ok(names)
    }

    /// Whether `name` is present in [`list`](Self::list).
    pub async fn has(&self, name: &ArtifactName) -> Result<bool, CoreError> {
        Ok(self.list().await?.iter().any(|n| n == name.as_str()))
    }

    fn unavailable(&self, err: &std::io::Error) -> CoreError {
        CoreError::StorageUnavailable {
            path: self.root.clone(),
            reason: err.to_string(),
        }
    }
}
