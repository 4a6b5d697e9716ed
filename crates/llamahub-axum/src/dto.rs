//! Request and reply bodies for the HTTP API contract.
//!
//! Field names and the plain-string replies match what existing
//! `llamafile_manager` clients send and expect.

use serde::{Deserialize, Serialize};

/// Reply when the artifact is already on disk.
pub const ALREADY_DOWNLOADED: &str = "already downloaded";
/// Reply when a transfer for the artifact is still running.
pub const ALREADY_DOWNLOADING: &str = "already downloading";
/// Reply for an accepted run or stop.
pub const OK: &str = "ok";
/// Reply when a live process for the artifact exists.
pub const ALREADY_RUNNING: &str = "already running";
/// Reply when nothing is registered to stop.
pub const NOT_RUNNING: &str = "not running";

/// `POST /download_llamafile`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLlamafileRequest {
    pub url: String,
    pub name: String,
}

/// `POST /download_progress`. Older clients also send the URL; it is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadProgressRequest {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// `POST /run_llamafile`
#[derive(Debug, Clone, Deserialize)]
pub struct RunLlamafileRequest {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// `POST /is_llamafile_running` and `POST /stop_llamafile`
#[derive(Debug, Clone, Deserialize)]
pub struct LlamafileNameRequest {
    pub name: String,
}

/// Reply to a download request: the accepted request echoed back, or a status string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DownloadReply {
    Accepted(DownloadLlamafileRequest),
    Status(&'static str),
}
