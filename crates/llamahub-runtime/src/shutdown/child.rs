//! Shutdown of a `tokio::process::Child` with SIGTERM → SIGKILL escalation.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
#[cfg(unix)]
use tokio::time::timeout;

/// How a child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    /// Reaped exit status.
    pub status: ExitStatus,
    /// The grace period ran out and the child was killed.
    pub forced: bool,
}

/// Terminate a child and reap it.
///
/// # Strategy
/// 1. Send SIGTERM and wait up to `grace` for the child to exit
/// 2. If still running, send SIGKILL
/// 3. Wait for the child to be reaped
///
/// On non-Unix platforms the child is killed immediately.
pub async fn shutdown_child(child: &mut Child, grace: Duration) -> io::Result<ChildExit> {
    #[cfg(unix)]
    {
        shutdown_unix(child, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        shutdown_immediate(child).await
    }
}

#[cfg(unix)]
async fn shutdown_unix(child: &mut Child, grace: Duration) -> io::Result<ChildExit> {
    // No PID means tokio already reaped it.
    let Some(pid) = child.id() else {
        let status = child.wait().await?;
        return Ok(ChildExit {
            status,
            forced: false,
        });
    };
    let pid = i32::try_from(pid).map_err(io::Error::other)?;

    if let Err(e) = signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
        if e == nix::errno::Errno::ESRCH {
            let status = child.wait().await?;
            return Ok(ChildExit {
                status,
                forced: false,
            });
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        return Ok(ChildExit {
            status: result?,
            forced: false,
        });
    }

    tracing::debug!(pid, grace_ms = grace.as_millis(), "Grace period elapsed, sending SIGKILL");
    // Child::kill sends SIGKILL and waits for the exit.
    child.kill().await?;
    let status = child.wait().await?;
    Ok(ChildExit {
        status,
        forced: true,
    })
}

#[cfg(not(unix))]
async fn shutdown_immediate(child: &mut Child) -> io::Result<ChildExit> {
    if let Some(status) = child.try_wait()? {
        return Ok(ChildExit {
            status,
            forced: false,
        });
    }
    child.kill().await?;
    let status = child.wait().await?;
    Ok(ChildExit {
        status,
        forced: true,
    })
}
