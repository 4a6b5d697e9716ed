//! Child process construction.
//!
//! The artifact path is the program and the caller's arguments are passed
//! as a list, so nothing is ever re-parsed by a shell.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::debug;

/// Attempts made when the kernel reports the file as busy for writing.
const TEXT_BUSY_RETRIES: u32 = 5;
const TEXT_BUSY_BACKOFF: Duration = Duration::from_millis(25);

/// Spawn `path` with `args`.
///
/// `ETXTBSY` (another thread still held a write descriptor when we forked)
/// is retried with a short backoff. `ENOEXEC` (no recognised header, as with
/// polyglot shell/APE artifacts) falls back to `sh <path> <args...>`.
pub(crate) async fn spawn_artifact(path: &Path, args: &[String]) -> io::Result<Child> {
    let program = program_path(path);
    let mut attempt = 0;

    loop {
        match command(&program).args(args).spawn() {
            Err(e) if is_text_busy(&e) && attempt < TEXT_BUSY_RETRIES => {
                attempt += 1;
                debug!(path = %program.display(), attempt, "Executable busy, retrying spawn");
                tokio::time::sleep(TEXT_BUSY_BACKOFF * attempt).await;
            }
            Err(e) if is_exec_format(&e) => {
                debug!(path = %program.display(), "Exec format rejected, starting through sh");
                return command(Path::new("sh")).arg(&program).args(args).spawn();
            }
            other => return other,
        }
    }
}

fn command(program: &Path) -> Command {
    let mut cmd = Command::new(program);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    cmd
}

// A bare file name would be looked up on PATH instead of run in place.
fn program_path(path: &Path) -> PathBuf {
    if path.components().count() > 1 || path.is_absolute() {
        path.to_path_buf()
    } else {
        Path::new(".").join(path)
    }
}

#[cfg(unix)]
fn is_text_busy(err: &io::Error) -> bool {
    err.raw_os_error() == Some(nix::errno::Errno::ETXTBSY as i32)
}

#[cfg(not(unix))]
const fn is_text_busy(_err: &io::Error) -> bool {
    false
}

#[cfg(unix)]
fn is_exec_format(err: &io::Error) -> bool {
    err.raw_os_error() == Some(nix::errno::Errno::ENOEXEC as i32)
}

#[cfg(not(unix))]
const fn is_exec_format(_err: &io::Error) -> bool {
    false
}
