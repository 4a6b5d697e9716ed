//! Progress and status records for downloads.
//!
//! Pure data types with no I/O dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use super::errors::DownloadError;
use crate::artifact::ArtifactName;

/// Where a transfer is in its lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DownloadStatus {
    /// Registered; the request has not been answered yet.
    #[default]
    Pending,
    /// Response headers received, body streaming into the target file.
    Downloading,
    /// End of stream reached and the file closed.
    Completed,
    /// The transfer aborted. Partial content stays on disk.
    Failed {
        /// What went wrong.
        error: DownloadError,
    },
}

impl DownloadStatus {
    /// `Completed` or `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }

    /// `Pending` or `Downloading`.
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        !self.is_terminal()
    }
}

/// One consistent view of a transfer's counters and status.
///
/// `content_length` is 0 while unknown: before the response arrives, and
/// for the whole transfer when the server sends no `Content-Length`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadProgress {
    /// Bytes written to the target file so far.
    pub written: u64,
    /// Declared body length, 0 if unknown.
    pub content_length: u64,
    /// Lifecycle state.
    pub status: DownloadStatus,
}

impl DownloadProgress {
    /// Percentage of the declared length written, 0 when the length is unknown.
    ///
    /// The HTTP stack never yields more body bytes than a declared
    /// `Content-Length`, so this reaches 100 exactly when
    /// `written == content_length`. The clamp keeps the value monotonic
    /// regardless.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.content_length == 0 {
            return 0;
        }
        let pct = (u128::from(self.written) * 100) / u128::from(self.content_length);
        u8::try_from(pct.min(100)).unwrap_or(100)
    }
}

/// Serializable snapshot of a download handle, for pollers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadSnapshot {
    /// Handle identifier.
    pub id: Uuid,
    /// Target artifact.
    pub artifact: ArtifactName,
    /// Source URL.
    pub url: String,
    /// File being written.
    pub target: PathBuf,
    /// Bytes written so far.
    pub written: u64,
    /// Declared length, 0 if unknown.
    pub content_length: u64,
    /// `written / content_length` as 0-100.
    pub percent: u8,
    /// Lifecycle state.
    pub status: DownloadStatus,
    /// When the download was requested.
    pub created_at: DateTime<Utc>,
}
