//! Port definitions (trait abstractions) for infrastructure.
//!
//! The lifecycle manager only ever talks to these traits. Concrete
//! implementations live in adapter crates:
//!
//! - `DownloadEnginePort` → `llamahub-download`
//! - `ProcessSupervisorPort` → `llamahub-runtime`
//!
//! # Design Rules
//!
//! - No HTTP client, process or web-framework types in signatures
//! - Ports express intent; adapters own the mechanics

use std::path::PathBuf;
use thiserror::Error;

use crate::artifact::ArtifactNameError;

mod download_engine;
mod process_supervisor;

pub use download_engine::DownloadEnginePort;
pub use process_supervisor::{LaunchSpec, ProcessSupervisorPort, RunHandle, StopOutcome};

/// Process-level failures reported by a supervisor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProcessError {
    /// There is no file to execute.
    #[error("Artifact file not found: {}", path.display())]
    ArtifactNotFound { path: PathBuf },

    /// The OS refused to start the process (permissions, exec format, ...).
    #[error("Failed to launch {}: {reason}", path.display())]
    LaunchFailed { path: PathBuf, reason: String },

    /// Signalling or reaping a process failed.
    #[error("Failed to stop process: {0}")]
    StopFailed(String),
}

/// Core error type for semantic domain errors.
///
/// Adapters map this to their own error types (HTTP status codes, exit
/// codes). Idempotent "already in that state" answers are not errors; they
/// are outcome variants returned by the lifecycle manager.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The artifacts directory is missing or unreadable.
    #[error("Artifact storage unavailable at {}: {reason}", path.display())]
    StorageUnavailable { path: PathBuf, reason: String },

    /// The supplied name cannot be an artifact.
    #[error("Invalid artifact name: {0}")]
    InvalidArtifactName(#[from] ArtifactNameError),

    /// No artifact with this name is present.
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    /// The artifact is still being downloaded.
    #[error("Artifact {0} is still downloading")]
    ArtifactBusy(String),

    /// Launching or stopping a process failed.
    #[error(transparent)]
    Process(#[from] ProcessError),
}
