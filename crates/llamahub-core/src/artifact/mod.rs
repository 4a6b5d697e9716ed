//! Artifacts: named executable files inside the artifacts directory.
//!
//! The directory is the only source of truth. Nothing here caches what is
//! on disk; every query re-reads the directory.

mod name;
mod store;

pub use name::{ArtifactName, ArtifactNameError};
pub use store::{ARTIFACT_SUFFIX, ArtifactStore};
