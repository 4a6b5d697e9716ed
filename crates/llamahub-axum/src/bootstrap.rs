//! Axum server bootstrap - the composition root.
//!
//! This module is the ONLY place where the download engine and the process
//! supervisor are instantiated and handed to the lifecycle manager.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use llamahub_core::paths::{DirectoryCreationStrategy, ensure_directory, resolve_artifacts_dir};
use llamahub_core::ports::{DownloadEnginePort, ProcessSupervisorPort};
use llamahub_core::{ArtifactStore, LifecycleManager};
use llamahub_download::{DEFAULT_CHUNK_SIZE, HttpDownloadEngine, ObserverConfig};
use llamahub_runtime::{DEFAULT_STOP_GRACE, LocalProcessSupervisor};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port for the HTTP server.
    pub port: u16,
    /// Explicit artifacts directory; falls back to the environment, then the default.
    pub artifacts_dir: Option<String>,
    /// Optional directory served under `/static`.
    pub static_dir: Option<PathBuf>,
    /// SIGTERM grace period before a stopped artifact is killed.
    pub stop_grace: Duration,
    /// Download write slice size.
    pub chunk_size: usize,
    /// Log/draw progress for every accepted download.
    pub observe_downloads: bool,
    /// CORS configuration.
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Loopback on port 8001 with default paths.
    pub fn with_defaults() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8001,
            artifacts_dir: None,
            static_dir: None,
            stop_grace: DEFAULT_STOP_GRACE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            observe_downloads: true,
            cors: CorsConfig::default(),
        }
    }

    /// Use an explicit artifacts directory.
    #[must_use]
    pub fn with_artifacts_dir(mut self, path: impl Into<String>) -> Self {
        self.artifacts_dir = Some(path.into());
        self
    }

    /// Set the static directory served under `/static`.
    #[must_use]
    pub fn with_static_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(path.into());
        self
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Application context for the Axum adapter.
pub struct AxumContext {
    /// The lifecycle facade every handler goes through.
    pub manager: Arc<LifecycleManager>,
    /// Progress observer settings; `None` disables observation.
    pub observer: Option<ObserverConfig>,
}

impl AxumContext {
    /// Context over an already assembled manager, without download observation.
    pub const fn new(manager: Arc<LifecycleManager>) -> Self {
        Self {
            manager,
            observer: None,
        }
    }
}

/// Resolve paths and assemble the manager with the HTTP engine and the local supervisor.
pub async fn bootstrap(config: &ServerConfig) -> Result<AxumContext> {
    let resolution = resolve_artifacts_dir(config.artifacts_dir.as_deref())?;
    ensure_directory(&resolution.path, DirectoryCreationStrategy::AutoCreate)?;

    tracing::info!(
        target: "llamahub.paths",
        artifacts_dir = %resolution.path.display(),
        artifacts_source = ?resolution.source,
        static_dir = ?config.static_dir,
        "Axum bootstrap resolved paths"
    );

    let client = reqwest::Client::builder()
        .user_agent(concat!("llamahub/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let engine: Arc<dyn DownloadEnginePort> =
        Arc::new(HttpDownloadEngine::with_client(client).with_chunk_size(config.chunk_size));
    let supervisor: Arc<dyn ProcessSupervisorPort> =
        Arc::new(LocalProcessSupervisor::with_stop_grace(config.stop_grace));

    let manager = Arc::new(LifecycleManager::new(
        ArtifactStore::new(resolution.path),
        engine,
        supervisor,
    ));

    Ok(AxumContext {
        manager,
        observer: config.observe_downloads.then(ObserverConfig::default),
    })
}

/// Serve until Ctrl-C, then stop every artifact process.
///
/// If `config.static_dir` is set, its files are served under `/static`.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let ctx = bootstrap(&config).await?;
    let manager = Arc::clone(&ctx.manager);

    let app = if let Some(ref static_dir) = config.static_dir {
        info!("Serving static assets from: {}", static_dir.display());
        crate::routes::create_static_router(ctx, static_dir, &config.cors)
    } else {
        crate::routes::create_router(ctx, &config.cors)
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("llamahub listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, terminating artifact processes");
    manager.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
}
