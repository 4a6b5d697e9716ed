//! User path normalisation.

use std::env;
use std::path::PathBuf;

use super::error::PathError;

/// Normalize a user-provided path, expanding `~` and making it absolute.
pub(super) fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = match trimmed.strip_prefix("~") {
        Some("") => dirs::home_dir().ok_or(PathError::NoHomeDir)?,
        Some(rest) if rest.starts_with('/') => {
            let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(trimmed),
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(expanded))
            .map_err(|e| PathError::CurrentDirError(e.to_string()))
    }
}
