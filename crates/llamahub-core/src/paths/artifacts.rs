//! Artifacts directory resolution.
//!
//! Provides utilities for resolving the artifacts directory from explicit
//! paths, environment variables, or platform defaults.

use std::env;
use std::path::PathBuf;

use super::error::PathError;
use super::platform::normalize_user_path;

/// Default relative location for artifacts under the user's home directory.
pub const DEFAULT_ARTIFACTS_DIR_RELATIVE: &str = ".local/share/llamafiles";

/// Environment variable naming the artifacts directory.
pub const ARTIFACTS_DIR_ENV: &str = "LLAMAHUB_ARTIFACTS_DIR";

/// Older variable name still honoured by existing deployments.
pub const LEGACY_ARTIFACTS_DIR_ENV: &str = "LLAMAFILES_DIR";

/// How the artifacts directory was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactsDirSource {
    /// The user passed an explicit path (CLI flag).
    Explicit,
    /// The path came from `LLAMAHUB_ARTIFACTS_DIR` / `LLAMAFILES_DIR`.
    EnvVar,
    /// Fallback default (`~/.local/share/llamafiles`).
    Default,
}

/// Resolution result for the artifacts directory.
#[derive(Debug, Clone)]
pub struct ArtifactsDirResolution {
    /// The resolved, absolute path.
    pub path: PathBuf,
    /// How the path was determined.
    pub source: ArtifactsDirSource,
}

/// Return the platform-specific default artifacts directory.
pub fn default_artifacts_dir() -> Result<PathBuf, PathError> {
    let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
    Ok(home.join(DEFAULT_ARTIFACTS_DIR_RELATIVE))
}

/// Resolve the artifacts directory from an explicit override, env var, or default.
///
/// Resolution order:
/// 1. Explicit path provided by caller (highest priority)
/// 2. `LLAMAHUB_ARTIFACTS_DIR`, then `LLAMAFILES_DIR`
/// 3. Default directory (`~/.local/share/llamafiles`)
pub fn resolve_artifacts_dir(explicit: Option<&str>) -> Result<ArtifactsDirResolution, PathError> {
    resolve_with_env(explicit, |key| env::var(key).ok())
}

fn resolve_with_env(
    explicit: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ArtifactsDirResolution, PathError> {
    if let Some(path_str) = explicit.filter(|p| !p.trim().is_empty()) {
        return Ok(ArtifactsDirResolution {
            path: normalize_user_path(path_str)?,
            source: ArtifactsDirSource::Explicit,
        });
    }

    for key in [ARTIFACTS_DIR_ENV, LEGACY_ARTIFACTS_DIR_ENV] {
        if let Some(env_path) = lookup(key)
            && !env_path.trim().is_empty()
        {
            return Ok(ArtifactsDirResolution {
                path: normalize_user_path(&env_path)?,
                source: ArtifactsDirSource::EnvVar,
            });
        }
    }

    Ok(ArtifactsDirResolution {
        path: default_artifacts_dir()?,
        source: ArtifactsDirSource::Default,
    })
}
