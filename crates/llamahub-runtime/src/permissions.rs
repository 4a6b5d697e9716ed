//! Execute-permission fix-up for downloaded artifacts.

use std::io;
use std::path::Path;

/// Add `0o111` to the file mode when no execute bit is set.
///
/// Returns whether the mode was changed. A no-op on non-Unix platforms.
#[cfg(unix)]
pub async fn ensure_executable(path: &Path) -> io::Result<bool> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    let mode = perms.mode();
    if mode & 0o111 != 0 {
        return Ok(false);
    }

    perms.set_mode(mode | 0o111);
    tokio::fs::set_permissions(path, perms).await?;
    tracing::debug!(path = %path.display(), mode = format!("{:o}", mode | 0o111), "Marked artifact executable");
    Ok(true)
}

#[cfg(not(unix))]
pub async fn ensure_executable(_path: &Path) -> io::Result<bool> {
    Ok(false)
}
