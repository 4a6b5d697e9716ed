//! Process supervisor port.
//!
//! The supervisor owns the live OS process; callers hold a `RunHandle`,
//! which is plain data identifying it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use super::ProcessError;
use crate::artifact::ArtifactName;

/// What to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Artifact being run.
    pub artifact: ArtifactName,
    /// Executable path (`root/name`).
    pub path: PathBuf,
    /// Arguments, passed to the process as a list without shell parsing.
    pub args: Vec<String>,
}

impl LaunchSpec {
    /// Create a launch spec.
    pub fn new(artifact: ArtifactName, path: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            artifact,
            path: path.into(),
            args,
        }
    }
}

/// A launched artifact process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHandle {
    /// Identifier the supervisor tracks the process under.
    pub id: Uuid,
    /// Artifact being run.
    pub artifact: ArtifactName,
    /// Executable path.
    pub path: PathBuf,
    /// Arguments the process was started with.
    pub args: Vec<String>,
    /// OS process ID, if the platform reported one.
    pub pid: Option<u32>,
    /// When the process was spawned.
    pub started_at: DateTime<Utc>,
}

impl RunHandle {
    /// Create a handle for a freshly spawned process.
    pub fn new(spec: LaunchSpec, pid: Option<u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            artifact: spec.artifact,
            path: spec.path,
            args: spec.args,
            pid,
            started_at: Utc::now(),
        }
    }
}

/// How a stop request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StopOutcome {
    /// The process was running and has been terminated and reaped.
    Terminated {
        /// Exit code, `None` when ended by a signal.
        exit_code: Option<i32>,
        /// Whether the grace period ran out and the process was killed.
        forced: bool,
    },
    /// The process had already exited; it was reaped without signalling.
    AlreadyExited {
        /// Exit code, `None` when ended by a signal.
        exit_code: Option<i32>,
    },
}

/// Launches and supervises artifact processes.
///
/// # Design Rules
///
/// - `launch` spawns synchronously and returns without waiting for the child
/// - `stop` is bounded: graceful signal, grace period, forced kill, reap
/// - After `stop` returns (Ok or Err) the supervisor no longer tracks the process
#[async_trait]
pub trait ProcessSupervisorPort: Send + Sync {
    /// Spawn the artifact as a child process.
    ///
    /// Returns `ProcessError::ArtifactNotFound` when the file is missing and
    /// `ProcessError::LaunchFailed` when the OS refuses to start it.
    async fn launch(&self, spec: LaunchSpec) -> Result<RunHandle, ProcessError>;

    /// Whether the process is tracked and has not exited.
    async fn is_alive(&self, handle: &RunHandle) -> bool;

    /// Terminate (if needed) and reap the process.
    async fn stop(&self, handle: &RunHandle) -> Result<StopOutcome, ProcessError>;
}
