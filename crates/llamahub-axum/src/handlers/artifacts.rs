//! Artifact listing handlers.

use axum::Json;
use axum::extract::{Path, State};

use crate::error::HttpError;
use crate::state::AppState;

/// List artifacts on disk.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<String>>, HttpError> {
    Ok(Json(state.manager.list_artifacts().await?))
}

/// Whether an artifact is on disk.
pub async fn has(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<bool>, HttpError> {
    Ok(Json(state.manager.has_artifact(&name).await?))
}
