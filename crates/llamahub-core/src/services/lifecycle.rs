//! Lifecycle manager - owns download and run handles.
//!
//! # Concurrency Model
//!
//! - Download handles and run handles each live in one `tokio::sync::Mutex`
//!   guarded map keyed by artifact name
//! - A download is claimed (handle inserted) under the same lock that
//!   performs the "already in flight / already present" checks, so two
//!   concurrent requests for a new name cannot both start a transfer
//! - The runs lock is held across launch, never across a stop. A stopping
//!   artifact is moved from the runs map to the stopping set, where
//!   `request_run` sees it as busy until its process has been reaped
//! - Lock order: downloads → runs → stopping (never the reverse)

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use futures_util::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::artifact::{ArtifactName, ArtifactStore};
use crate::download::{DownloadHandle, DownloadSnapshot};
use crate::ports::{
    CoreError, DownloadEnginePort, LaunchSpec, ProcessSupervisorPort, RunHandle, StopOutcome,
};

/// Result of [`LifecycleManager::request_download`].
#[derive(Debug, Clone)]
pub enum DownloadRequestOutcome {
    /// A new transfer was registered and started.
    Started(Arc<DownloadHandle>),
    /// The artifact is already on disk; nothing was fetched.
    AlreadyPresent,
    /// A transfer for this name is still running; no second one was started.
    AlreadyInProgress(Arc<DownloadHandle>),
}

/// Result of [`LifecycleManager::request_run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunRequestOutcome {
    /// A new process was spawned.
    Started(RunHandle),
    /// A live process for this artifact exists; no second one was spawned.
    AlreadyRunning(RunHandle),
}

/// Result of [`LifecycleManager::stop_run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRunOutcome {
    /// The registered process was stopped and reaped.
    Stopped(StopOutcome),
    /// Nothing was registered under this name.
    NotRunning,
}

/// Facade over the artifact store, the download engine and the process
/// supervisor.
///
/// All handle bookkeeping goes through these methods; the maps are never
/// exposed.
pub struct LifecycleManager {
    store: ArtifactStore,
    engine: Arc<dyn DownloadEnginePort>,
    supervisor: Arc<dyn ProcessSupervisorPort>,
    downloads: Mutex<HashMap<ArtifactName, Arc<DownloadHandle>>>,
    runs: Mutex<HashMap<ArtifactName, RunHandle>>,
    stopping: StdMutex<HashSet<ArtifactName>>,
}

/// Scope guard that keeps names in the stopping set until dropped.
///
/// Dropping also covers a caller that abandons the stop halfway.
struct StoppingGuard<'a> {
    stopping: &'a StdMutex<HashSet<ArtifactName>>,
    names: Vec<ArtifactName>,
}

impl<'a> StoppingGuard<'a> {
    fn new(stopping: &'a StdMutex<HashSet<ArtifactName>>, names: Vec<ArtifactName>) -> Self {
        stopping
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(names.iter().cloned());
        Self { stopping, names }
    }
}

impl Drop for StoppingGuard<'_> {
    fn drop(&mut self) {
        let mut stopping = self.stopping.lock().unwrap_or_else(PoisonError::into_inner);
        for name in &self.names {
            stopping.remove(name);
        }
    }
}

impl LifecycleManager {
    /// Create a manager over `store`, delegating to the given ports.
    pub fn new(
        store: ArtifactStore,
        engine: Arc<dyn DownloadEnginePort>,
        supervisor: Arc<dyn ProcessSupervisorPort>,
    ) -> Self {
        Self {
            store,
            engine,
            supervisor,
            downloads: Mutex::new(HashMap::new()),
            runs: Mutex::new(HashMap::new()),
            stopping: StdMutex::new(HashSet::new()),
        }
    }

    /// The artifact store this manager reads from.
    pub const fn store(&self) -> &ArtifactStore {
        &self.store
    }

    // =========================================================================
    // Artifacts
    // =========================================================================

    /// Names of all artifacts currently on disk, sorted.
    pub async fn list_artifacts(&self) -> Result<Vec<String>, CoreError> {
        self.store.list().await
    }

    /// Whether an artifact with this name is on disk.
    ///
    /// Names that cannot be artifacts (path separators, `..`) are simply
    /// absent.
    pub async fn has_artifact(&self, name: &str) -> Result<bool, CoreError> {
        let Ok(name) = ArtifactName::parse(name) else {
            return Ok(false);
        };
        self.store.has(&name).await
    }

    // =========================================================================
    // Downloads
    // =========================================================================

    /// Fetch `url` into the artifact `name` unless it is already present or
    /// already being fetched.
    ///
    /// Returns as soon as the transfer is registered; failures that happen
    /// later are recorded on the handle.
    pub async fn request_download(
        &self,
        url: &str,
        name: &str,
    ) -> Result<DownloadRequestOutcome, CoreError> {
        let name = ArtifactName::parse(name)?;
        self.store.require_accepted(&name)?;

        let mut downloads = self.downloads.lock().await;

        if let Some(existing) = downloads.get(&name)
            && existing.is_in_flight()
        {
            debug!(artifact = %name, id = %existing.id(), "Download already in progress");
            return Ok(DownloadRequestOutcome::AlreadyInProgress(Arc::clone(
                existing,
            )));
        }

        if self.store.has(&name).await? {
            debug!(artifact = %name, "Artifact already present, not downloading");
            return Ok(DownloadRequestOutcome::AlreadyPresent);
        }

        let handle = Arc::new(DownloadHandle::new(
            url,
            name.clone(),
            self.store.path_for(&name),
        ));
        downloads.insert(name.clone(), Arc::clone(&handle));
        self.engine.start(Arc::clone(&handle));
        drop(downloads);

        info!(
            artifact = %name,
            id = %handle.id(),
            url = %url,
            target = %handle.target().display(),
            "Download started"
        );
        Ok(DownloadRequestOutcome::Started(handle))
    }

    /// Percentage (0-100) of the most recent download for `name`.
    ///
    /// Returns 0 both for a download that has not progressed and for a name
    /// that was never requested; use [`download_status`](Self::download_status)
    /// to tell them apart.
    pub async fn download_progress(&self, name: &str) -> u8 {
        self.download_handle(name)
            .await
            .map_or(0, |handle| handle.percent())
    }

    /// Snapshot of the most recent download for `name`, `None` if never requested.
    pub async fn download_status(&self, name: &str) -> Option<DownloadSnapshot> {
        self.download_handle(name)
            .await
            .map(|handle| handle.snapshot())
    }

    /// The most recent download handle for `name`, for change-driven observers.
    pub async fn download_handle(&self, name: &str) -> Option<Arc<DownloadHandle>> {
        let name = ArtifactName::parse(name).ok()?;
        self.downloads.lock().await.get(&name).cloned()
    }

    /// Snapshots of every registered download, sorted by artifact name.
    pub async fn list_downloads(&self) -> Vec<DownloadSnapshot> {
        let downloads = self.downloads.lock().await;
        let mut snapshots: Vec<DownloadSnapshot> =
            downloads.values().map(|h| h.snapshot()).collect();
        snapshots.sort_by(|a, b| a.artifact.cmp(&b.artifact));
        snapshots
    }

    // =========================================================================
    // Runs
    // =========================================================================

    /// Launch artifact `name` with `args` unless a live process for it exists.
    ///
    /// A registered process that has exited on its own is reaped and
    /// replaced.
    pub async fn request_run(
        &self,
        name: &str,
        args: Vec<String>,
    ) -> Result<RunRequestOutcome, CoreError> {
        let name = ArtifactName::parse(name)?;
        self.store.require_accepted(&name)?;

        let downloading = self
            .downloads
            .lock()
            .await
            .get(&name)
            .is_some_and(|h| h.is_in_flight());
        if downloading {
            return Err(CoreError::ArtifactBusy(name.to_string()));
        }

        let mut runs = self.runs.lock().await;

        if self.is_stopping(&name) {
            return Err(CoreError::ArtifactBusy(name.to_string()));
        }

        if let Some(existing) = runs.get(&name).cloned() {
            if self.supervisor.is_alive(&existing).await {
                debug!(artifact = %name, pid = ?existing.pid, "Artifact already running");
                return Ok(RunRequestOutcome::AlreadyRunning(existing));
            }

            runs.remove(&name);
            match self.supervisor.stop(&existing).await {
                Ok(outcome) => {
                    info!(artifact = %name, pid = ?existing.pid, ?outcome, "Reaped exited process");
                }
                Err(e) => {
                    warn!(artifact = %name, pid = ?existing.pid, error = %e, "Failed to reap exited process");
                }
            }
        }

        if !self.store.has(&name).await? {
            return Err(CoreError::ArtifactNotFound(name.to_string()));
        }

        let spec = LaunchSpec::new(name.clone(), self.store.path_for(&name), args);
        let handle = self.supervisor.launch(spec).await?;
        runs.insert(name.clone(), handle.clone());

        info!(
            artifact = %name,
            pid = ?handle.pid,
            args = ?handle.args,
            "Artifact started"
        );
        Ok(RunRequestOutcome::Started(handle))
    }

    /// Whether a process is registered for `name` and still alive.
    pub async fn is_running(&self, name: &str) -> bool {
        let Ok(name) = ArtifactName::parse(name) else {
            return false;
        };
        let runs = self.runs.lock().await;
        match runs.get(&name) {
            Some(handle) => self.supervisor.is_alive(handle).await,
            None => false,
        }
    }

    /// Stop the process registered for `name`.
    ///
    /// The handle is unregistered whether or not stopping succeeds. Until
    /// the process is reaped, `request_run` for `name` answers
    /// [`CoreError::ArtifactBusy`]; other artifacts are not held up.
    pub async fn stop_run(&self, name: &str) -> Result<StopRunOutcome, CoreError> {
        let name = ArtifactName::parse(name)?;

        let mut runs = self.runs.lock().await;
        let Some(handle) = runs.remove(&name) else {
            return Ok(StopRunOutcome::NotRunning);
        };
        let _stopping = StoppingGuard::new(&self.stopping, vec![name.clone()]);
        drop(runs);

        let outcome = self.supervisor.stop(&handle).await?;
        info!(artifact = %name, pid = ?handle.pid, ?outcome, "Artifact stopped");
        Ok(StopRunOutcome::Stopped(outcome))
    }

    fn is_stopping(&self, name: &ArtifactName) -> bool {
        self.stopping
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }

    /// Handles of every registered run, sorted by artifact name.
    pub async fn list_runs(&self) -> Vec<RunHandle> {
        let runs = self.runs.lock().await;
        let mut handles: Vec<RunHandle> = runs.values().cloned().collect();
        handles.sort_by(|a, b| a.artifact.cmp(&b.artifact));
        handles
    }

    /// Stop every registered process.
    ///
    /// The stops run concurrently, so the whole call takes about one grace
    /// period however many processes ignore the termination signal.
    pub async fn shutdown(&self) {
        let mut runs = self.runs.lock().await;
        let handles: Vec<RunHandle> = runs.drain().map(|(_, handle)| handle).collect();
        let _stopping = StoppingGuard::new(
            &self.stopping,
            handles.iter().map(|h| h.artifact.clone()).collect(),
        );
        drop(runs);

        info!(count = handles.len(), "Stopping all artifact processes");
        join_all(handles.iter().map(|handle| async move {
            if let Err(e) = self.supervisor.stop(handle).await {
                warn!(artifact = %handle.artifact, error = %e, "Failed to stop process during shutdown");
            }
        }))
        .await;
    }
}
