//! Command-line configuration for the `llamahub` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use llamahub_download::DEFAULT_CHUNK_SIZE;

use crate::bootstrap::{CorsConfig, ServerConfig};

/// Download and run llamafile artifacts over HTTP.
#[derive(Debug, Parser)]
#[command(name = "llamahub", version, about)]
pub struct Cli {
    /// Directory holding `.llamafile` artifacts.
    ///
    /// Falls back to `LLAMAHUB_ARTIFACTS_DIR`, then `LLAMAFILES_DIR`, then
    /// `~/.local/share/llamafiles`.
    #[arg(long, value_name = "DIR")]
    pub artifacts_dir: Option<String>,

    /// Interface to bind.
    #[arg(long, env = "LLAMAHUB_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "LLAMAHUB_PORT", default_value_t = 8001)]
    pub port: u16,

    /// Directory served under `/static`.
    #[arg(long, env = "LLAMAHUB_STATIC_DIR", value_name = "DIR")]
    pub static_dir: Option<PathBuf>,

    /// Seconds a stopped artifact gets to exit after SIGTERM before it is killed.
    #[arg(long, env = "LLAMAHUB_STOP_GRACE_SECS", default_value_t = 5)]
    pub stop_grace_secs: u64,

    /// Largest slice a download writes at once, in bytes.
    #[arg(long, env = "LLAMAHUB_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Comma-separated CORS origins; empty allows any origin.
    #[arg(long, env = "LLAMAHUB_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Do not draw or log per-download progress.
    #[arg(long)]
    pub quiet_downloads: bool,
}

impl Cli {
    /// Turn parsed arguments into a server configuration.
    pub fn into_server_config(self) -> ServerConfig {
        let origins: Vec<String> = self
            .allowed_origins
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        ServerConfig {
            host: self.host,
            port: self.port,
            artifacts_dir: self.artifacts_dir,
            static_dir: self.static_dir,
            stop_grace: Duration::from_secs(self.stop_grace_secs),
            chunk_size: self.chunk_size,
            observe_downloads: !self.quiet_downloads,
            cors: if origins.is_empty() {
                CorsConfig::AllowAll
            } else {
                CorsConfig::AllowOrigins(origins)
            },
        }
    }
}
