//! Shared download handle.
//!
//! One writer (the transfer task) and any number of readers. All three
//! progress fields live behind one `watch` channel, so a reader always sees
//! a `{written, content_length, status}` triple that the writer published
//! together.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use uuid::Uuid;

use super::errors::DownloadError;
use super::types::{DownloadProgress, DownloadSnapshot, DownloadStatus};
use crate::artifact::ArtifactName;

/// One in-flight or finished download.
///
/// Shared as `Arc<DownloadHandle>` between the lifecycle manager (which
/// owns its registration) and the engine (which drives the mutators).
#[derive(Debug)]
pub struct DownloadHandle {
    id: Uuid,
    url: String,
    artifact: ArtifactName,
    target: PathBuf,
    created_at: DateTime<Utc>,
    progress_tx: watch::Sender<DownloadProgress>,
}

impl DownloadHandle {
    /// Create a `Pending` handle with zeroed counters.
    pub fn new(url: impl Into<String>, artifact: ArtifactName, target: impl Into<PathBuf>) -> Self {
        let (progress_tx, _) = watch::channel(DownloadProgress::default());
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            artifact,
            target: target.into(),
            created_at: Utc::now(),
            progress_tx,
        }
    }

    pub const fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub const fn artifact(&self) -> &ArtifactName {
        &self.artifact
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    // =========================================================================
    // Readers
    // =========================================================================

    /// Current progress record.
    pub fn progress(&self) -> DownloadProgress {
        self.progress_tx.borrow().clone()
    }

    /// Current percentage, see [`DownloadProgress::percent`].
    pub fn percent(&self) -> u8 {
        self.progress_tx.borrow().percent()
    }

    /// Current status.
    pub fn status(&self) -> DownloadStatus {
        self.progress_tx.borrow().status.clone()
    }

    /// Whether the transfer has not reached a terminal status yet.
    pub fn is_in_flight(&self) -> bool {
        self.progress_tx.borrow().status.is_in_flight()
    }

    /// Receiver that wakes on every published change.
    pub fn subscribe(&self) -> watch::Receiver<DownloadProgress> {
        self.progress_tx.subscribe()
    }

    /// Serializable view for pollers.
    pub fn snapshot(&self) -> DownloadSnapshot {
        let progress = self.progress();
        DownloadSnapshot {
            id: self.id,
            artifact: self.artifact.clone(),
            url: self.url.clone(),
            target: self.target.clone(),
            written: progress.written,
            content_length: progress.content_length,
            percent: progress.percent(),
            status: progress.status,
            created_at: self.created_at,
        }
    }

    // =========================================================================
    // Writer side (download engine only)
    // =========================================================================

    /// Response headers arrived: record the declared length (0 if none)
    /// and move to `Downloading`.
    pub fn begin_transfer(&self, content_length: u64) {
        self.progress_tx.send_modify(|p| {
            p.content_length = content_length;
            p.written = 0;
            p.status = DownloadStatus::Downloading;
        });
    }

    /// A chunk of `len` bytes has been written to the target file.
    pub fn record_written(&self, len: u64) {
        self.progress_tx.send_modify(|p| {
            p.written = p.written.saturating_add(len);
        });
    }

    /// End of stream reached and the file closed.
    ///
    /// The last `len` bytes are published together with `Completed`, so a
    /// reader that sees the final byte count also sees the terminal status.
    pub fn finish(&self, len: u64) {
        self.progress_tx.send_modify(|p| {
            p.written = p.written.saturating_add(len);
            p.status = DownloadStatus::Completed;
        });
    }

    /// The transfer aborted.
    pub fn fail(&self, error: DownloadError) {
        self.progress_tx.send_modify(|p| {
            p.status = DownloadStatus::Failed { error };
        });
    }
}
