//! Download engine port.

use std::sync::Arc;

use crate::download::DownloadHandle;

/// Runs transfers in the background.
///
/// The caller creates and registers the handle first; `start` only kicks
/// off the transfer and must return without waiting for network I/O.
/// Progress and the final outcome (including failures) are published on
/// the handle. There is no way to cancel a started transfer.
pub trait DownloadEnginePort: Send + Sync {
    /// Begin fetching `handle.url()` into `handle.target()`.
    fn start(&self, handle: Arc<DownloadHandle>);
}
