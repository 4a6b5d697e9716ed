//! Streaming HTTP transfers.
//!
//! Each transfer runs on its own tokio task:
//!
//! 1. `GET url`; a non-2xx status fails the handle
//! 2. Record `Content-Length` (0 if absent) and move to `Downloading`
//! 3. Create or truncate the target file
//! 4. Write the body in slices of at most `chunk_size` bytes, counting each
//!    slice once the next one has been written
//! 5. Flush and close the file, then publish the held-back slice together
//!    with `Completed`
//!
//! Holding back the last slice keeps a full-length count from ever being
//! visible while the file is still open.
//!
//! Any error along the way marks the handle `Failed`; partial content stays
//! on disk.

use std::path::PathBuf;
use std::sync::Arc;

use futures_util::StreamExt;
use llamahub_core::artifact::ArtifactName;
use llamahub_core::download::{DownloadError, DownloadHandle};
use llamahub_core::ports::DownloadEnginePort;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Largest slice written (and counted) at once.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Download engine backed by a shared `reqwest::Client`.
///
/// [`start`](DownloadEnginePort::start) spawns onto the current tokio
/// runtime, so it must be called from within one.
#[derive(Debug, Clone)]
pub struct HttpDownloadEngine {
    client: Client,
    chunk_size: usize,
}

impl HttpDownloadEngine {
    /// Engine with a default client and [`DEFAULT_CHUNK_SIZE`].
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Engine reusing an existing client (connection pool, proxies, TLS).
    pub const fn with_client(client: Client) -> Self {
        Self {
            client,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the write slice size. Zero is treated as one.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Create a handle for `url` → `target` and start it.
    ///
    /// For callers that do not go through the lifecycle manager (CLI tools,
    /// tests). The returned handle is the only way to observe the transfer.
    pub fn begin(
        &self,
        url: impl Into<String>,
        artifact: ArtifactName,
        target: impl Into<PathBuf>,
    ) -> Arc<DownloadHandle> {
        let handle = Arc::new(DownloadHandle::new(url, artifact, target));
        self.start(Arc::clone(&handle));
        handle
    }
}

impl Default for HttpDownloadEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadEnginePort for HttpDownloadEngine {
    fn start(&self, handle: Arc<DownloadHandle>) {
        let client = self.client.clone();
        let chunk_size = self.chunk_size;
        // The task owns a handle reference, so the transfer outlives callers.
        tokio::spawn(async move {
            run_transfer(&client, &handle, chunk_size).await;
        });
    }
}

/// Bytes written so far, split by whether the handle has been told.
#[derive(Debug, Default)]
struct Written {
    total: u64,
    unpublished: u64,
}

impl Written {
    /// Count a slice that is on disk, publishing the one before it.
    fn push(&mut self, handle: &DownloadHandle, len: u64) {
        if self.unpublished > 0 {
            handle.record_written(self.unpublished);
        }
        self.unpublished = len;
        self.total += len;
    }
}

async fn run_transfer(client: &Client, handle: &DownloadHandle, chunk_size: usize) {
    debug!(
        id = %handle.id(),
        artifact = %handle.artifact(),
        url = %handle.url(),
        "Transfer task started"
    );

    let mut written = Written::default();
    match transfer(client, handle, chunk_size, &mut written).await {
        Ok(()) => {
            handle.finish(written.unpublished);
            info!(
                id = %handle.id(),
                artifact = %handle.artifact(),
                bytes = written.total,
                "Transfer completed"
            );
        }
        Err(error) => {
            handle.record_written(written.unpublished);
            warn!(
                id = %handle.id(),
                artifact = %handle.artifact(),
                written = written.total,
                error = %error,
                "Transfer failed"
            );
            handle.fail(error);
        }
    }
}

/// Stream the body into the target.
///
/// The file is closed before this returns, so the caller can mark the
/// handle `Completed` knowing nobody has it open for writing.
async fn transfer(
    client: &Client,
    handle: &DownloadHandle,
    chunk_size: usize,
    written: &mut Written,
) -> Result<(), DownloadError> {
    let response = client
        .get(handle.url())
        .send()
        .await
        .map_err(|e| network_error(&e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::network_with_status(
            format!("HTTP {status}"),
            status.as_u16(),
        ));
    }

    let content_length = response.content_length().unwrap_or(0);
    handle.begin_transfer(content_length);

    let mut file = File::create(handle.target()).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| network_error(&e))?;
        for slice in chunk.chunks(chunk_size) {
            file.write_all(slice).await?;
            written.push(handle, slice.len() as u64);
        }
    }

    file.flush().await?;
    drop(file);
    Ok(())
}

fn network_error(err: &reqwest::Error) -> DownloadError {
    match err.status() {
        Some(status) => DownloadError::network_with_status(err.to_string(), status.as_u16()),
        None => DownloadError::network(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chunk_size() {
        assert_eq!(HttpDownloadEngine::new().chunk_size(), DEFAULT_CHUNK_SIZE);
        assert_eq!(DEFAULT_CHUNK_SIZE, 1024);
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        let engine = HttpDownloadEngine::new().with_chunk_size(0);
        assert_eq!(engine.chunk_size(), 1);
    }

    fn handle() -> DownloadHandle {
        DownloadHandle::new(
            "http://example.test/a.llamafile",
            ArtifactName::parse("a.llamafile").unwrap(),
            "/tmp/a.llamafile",
        )
    }

    #[test]
    fn test_last_slice_is_held_back_until_finish() {
        let h = handle();
        h.begin_transfer(30);
        let mut written = Written::default();

        for _ in 0..3 {
            written.push(&h, 10);
        }
        assert_eq!(written.total, 30);
        assert_eq!(h.progress().written, 20);
        assert!(h.percent() < 100);

        h.finish(written.unpublished);
        assert_eq!(h.percent(), 100);
        assert!(!h.is_in_flight());
    }

    #[test]
    fn test_custom_chunk_size() {
        let engine = HttpDownloadEngine::default().with_chunk_size(64 * 1024);
        assert_eq!(engine.chunk_size(), 65_536);
    }
}
