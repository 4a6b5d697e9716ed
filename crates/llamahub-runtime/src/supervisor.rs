//! Local child-process supervisor.
//!
//! # Ownership
//!
//! The supervisor owns every `Child` it spawns, keyed by the run id carried
//! in the `RunHandle`. Callers never see the child itself. Children are
//! spawned with `kill_on_drop`, so dropping the supervisor kills whatever
//! is still tracked.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use llamahub_core::ports::{
    LaunchSpec, ProcessError, ProcessSupervisorPort, RunHandle, StopOutcome,
};
use tokio::process::Child;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::permissions::ensure_executable;
use crate::shutdown::shutdown_child;
use crate::spawn::spawn_artifact;

/// Time a process gets to exit after SIGTERM before it is killed.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

/// Supervises artifact processes on the local machine.
pub struct LocalProcessSupervisor {
    children: Mutex<HashMap<Uuid, Child>>,
    stop_grace: Duration,
}

impl LocalProcessSupervisor {
    pub fn new() -> Self {
        Self::with_stop_grace(DEFAULT_STOP_GRACE)
    }

    /// Supervisor with a custom SIGTERM grace period.
    pub fn with_stop_grace(stop_grace: Duration) -> Self {
        Self {
            children: Mutex::new(HashMap::new()),
            stop_grace,
        }
    }

    pub const fn stop_grace(&self) -> Duration {
        self.stop_grace
    }

    /// Number of children currently tracked (alive or not yet reaped).
    pub async fn tracked(&self) -> usize {
        self.children.lock().await.len()
    }
}

impl Default for LocalProcessSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessSupervisorPort for LocalProcessSupervisor {
    async fn launch(&self, spec: LaunchSpec) -> Result<RunHandle, ProcessError> {
        let is_file = tokio::fs::metadata(&spec.path)
            .await
            .is_ok_and(|m| m.is_file());
        if !is_file {
            return Err(ProcessError::ArtifactNotFound { path: spec.path });
        }

        ensure_executable(&spec.path)
            .await
            .map_err(|e| ProcessError::LaunchFailed {
                path: spec.path.clone(),
                reason: format!("cannot set execute permission: {e}"),
            })?;

        let child = spawn_artifact(&spec.path, &spec.args)
            .await
            .map_err(|e| ProcessError::LaunchFailed {
                path: spec.path.clone(),
                reason: e.to_string(),
            })?;

        let handle = RunHandle::new(spec, child.id());
        self.children.lock().await.insert(handle.id, child);

        info!(
            id = %handle.id,
            artifact = %handle.artifact,
            pid = ?handle.pid,
            "Spawned artifact process"
        );
        Ok(handle)
    }

    async fn is_alive(&self, handle: &RunHandle) -> bool {
        let mut children = self.children.lock().await;
        let Some(child) = children.get_mut(&handle.id) else {
            return false;
        };

        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!(id = %handle.id, pid = ?handle.pid, %status, "Process has exited");
                false
            }
            Err(e) => {
                warn!(id = %handle.id, pid = ?handle.pid, error = %e, "Failed to poll process");
                false
            }
        }
    }

    async fn stop(&self, handle: &RunHandle) -> Result<StopOutcome, ProcessError> {
        // Removed before waiting so the map lock is not held for the grace period.
        let Some(mut child) = self.children.lock().await.remove(&handle.id) else {
            debug!(id = %handle.id, "Stop requested for untracked process");
            return Ok(StopOutcome::AlreadyExited { exit_code: None });
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                return Ok(StopOutcome::AlreadyExited {
                    exit_code: status.code(),
                });
            }
            Ok(None) => {}
            // The child is no longer tracked, so it still has to be signalled and reaped.
            Err(e) => {
                warn!(id = %handle.id, pid = ?handle.pid, error = %e, "Failed to poll process before stopping");
            }
        }

        let exit = shutdown_child(&mut child, self.stop_grace)
            .await
            .map_err(|e| ProcessError::StopFailed(e.to_string()))?;

        if exit.forced {
            warn!(id = %handle.id, pid = ?handle.pid, "Process ignored SIGTERM and was killed");
        }
        Ok(StopOutcome::Terminated {
            exit_code: exit.status.code(),
            forced: exit.forced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grace() {
        assert_eq!(LocalProcessSupervisor::new().stop_grace(), DEFAULT_STOP_GRACE);
        assert_eq!(DEFAULT_STOP_GRACE, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_untracked_handle() {
        let supervisor = LocalProcessSupervisor::with_stop_grace(Duration::from_millis(10));
        let handle = RunHandle::new(
            LaunchSpec::new(
                llamahub_core::ArtifactName::parse("a.llamafile").unwrap(),
                "/nowhere/a.llamafile",
                vec![],
            ),
            None,
        );

        assert!(!supervisor.is_alive(&handle).await);
        assert_eq!(
            supervisor.stop(&handle).await.unwrap(),
            StopOutcome::AlreadyExited { exit_code: None }
        );
    }

    #[tokio::test]
    async fn test_launch_missing_file() {
        let supervisor = LocalProcessSupervisor::new();
        let spec = LaunchSpec::new(
            llamahub_core::ArtifactName::parse("a.llamafile").unwrap(),
            "/nowhere/a.llamafile",
            vec![],
        );

        let err = supervisor.launch(spec).await.unwrap_err();
        assert!(matches!(err, ProcessError::ArtifactNotFound { .. }));
        assert_eq!(supervisor.tracked().await, 0);
    }
}
