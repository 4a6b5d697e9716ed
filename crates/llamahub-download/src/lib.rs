#![doc = include_str!("../README.md")]

mod engine;
mod progress;

pub use engine::{DEFAULT_CHUNK_SIZE, HttpDownloadEngine};
pub use progress::{ObserverConfig, ProgressThrottle, observe_progress};

// Re-export core types for convenience
pub use llamahub_core::download::{
    DownloadError, DownloadHandle, DownloadProgress, DownloadSnapshot, DownloadStatus,
};
pub use llamahub_core::ports::DownloadEnginePort;
