#![doc = include_str!("../README.md")]

pub mod artifact;
pub mod download;
pub mod paths;
pub mod ports;
pub mod services;

// Re-export commonly used types for convenience
pub use artifact::{ARTIFACT_SUFFIX, ArtifactName, ArtifactNameError, ArtifactStore};
pub use download::{
    DownloadError, DownloadHandle, DownloadProgress, DownloadSnapshot, DownloadStatus,
};
pub use ports::{
    CoreError, DownloadEnginePort, LaunchSpec, ProcessError, ProcessSupervisorPort, RunHandle,
    StopOutcome,
};
pub use services::{
    DownloadRequestOutcome, LifecycleManager, RunRequestOutcome, StopRunOutcome,
};

// Re-export path utilities
pub use paths::{
    ArtifactsDirResolution, ArtifactsDirSource, DEFAULT_ARTIFACTS_DIR_RELATIVE,
    DirectoryCreationStrategy, PathError, default_artifacts_dir, ensure_directory,
    resolve_artifacts_dir, verify_writable,
};
