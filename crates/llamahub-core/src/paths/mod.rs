//! Path utilities for the artifacts directory.
//!
//! - Artifacts directory resolution (explicit, environment, default)
//! - Directory creation and writability checks
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O - adapters decide what to do on failure

mod artifacts;
mod ensure;
mod error;
mod platform;

pub use artifacts::{
    ARTIFACTS_DIR_ENV, ArtifactsDirResolution, ArtifactsDirSource, DEFAULT_ARTIFACTS_DIR_RELATIVE,
    LEGACY_ARTIFACTS_DIR_ENV, default_artifacts_dir, resolve_artifacts_dir,
};
pub use ensure::{DirectoryCreationStrategy, ensure_directory, verify_writable};
pub use error::PathError;
