//! Validated artifact names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reasons an artifact name is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArtifactNameError {
    /// The name is empty or only whitespace.
    #[error("artifact name cannot be empty")]
    Empty,

    /// The name would resolve outside the artifacts directory.
    #[error("artifact name must be a plain file name: {0:?}")]
    NotAFileName(String),

    /// The name does not carry the artifact suffix.
    #[error("artifact name {name:?} must end with {suffix}")]
    MissingSuffix { name: String, suffix: String },
}

/// A file name inside the artifacts directory.
///
/// Names come from untrusted HTTP clients, so construction rejects anything
/// that could address a path other than `root/name`: separators, `.`/`..`
/// and NUL bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactName(String);

impl ArtifactName {
    /// Validate and wrap a raw name.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ArtifactNameError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ArtifactNameError::Empty);
        }
        if raw == "."
            || raw == ".."
            || raw.contains(['/', '\\', '\0'])
        {
            return Err(ArtifactNameError::NotAFileName(raw));
        }
        Ok(Self(raw))
    }

    /// The name as stored on disk.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArtifactName {
    type Err = ArtifactNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ArtifactName {
    type Error = ArtifactNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ArtifactName> for String {
    fn from(name: ArtifactName) -> Self {
        name.0
    }
}

impl AsRef<str> for ArtifactName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
