//! Download domain types.
//!
//! The handle and its progress record are defined here so the lifecycle
//! manager can create and register handles without depending on the HTTP
//! engine that fills them in.

mod errors;
mod handle;
mod types;

pub use errors::DownloadError;
pub use handle::DownloadHandle;
pub use types::{DownloadProgress, DownloadSnapshot, DownloadStatus};
