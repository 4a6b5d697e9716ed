//! Download handlers.

use axum::Json;
use axum::extract::{Path, State};
use llamahub_core::{DownloadRequestOutcome, DownloadSnapshot};
use llamahub_download::observe_progress;

use crate::dto::{
    ALREADY_DOWNLOADED, ALREADY_DOWNLOADING, DownloadLlamafileRequest, DownloadProgressRequest,
    DownloadReply,
};
use crate::error::HttpError;
use crate::state::AppState;

/// Start a download unless the artifact is present or already downloading.
pub async fn download(
    State(state): State<AppState>,
    Json(req): Json<DownloadLlamafileRequest>,
) -> Result<Json<DownloadReply>, HttpError> {
    let reply = match state.manager.request_download(&req.url, &req.name).await? {
        DownloadRequestOutcome::Started(handle) => {
            if let Some(config) = state.observer.clone() {
                tokio::spawn(observe_progress(handle, config));
            }
            DownloadReply::Accepted(req)
        }
        DownloadRequestOutcome::AlreadyPresent => DownloadReply::Status(ALREADY_DOWNLOADED),
        DownloadRequestOutcome::AlreadyInProgress(_) => DownloadReply::Status(ALREADY_DOWNLOADING),
    };
    Ok(Json(reply))
}

/// Percentage of the latest download for a name, 0 when there is none.
pub async fn progress(
    State(state): State<AppState>,
    Json(req): Json<DownloadProgressRequest>,
) -> Json<u8> {
    Json(state.manager.download_progress(&req.name).await)
}

/// All recorded downloads.
pub async fn list(State(state): State<AppState>) -> Json<Vec<DownloadSnapshot>> {
    Json(state.manager.list_downloads().await)
}

/// The latest download for a name.
pub async fn status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DownloadSnapshot>, HttpError> {
    state
        .manager
        .download_status(&name)
        .await
        .map(Json)
        .ok_or(HttpError::DownloadNotFound(name))
}
