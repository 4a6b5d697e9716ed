//! Run handlers - artifact process start/stop.

use axum::Json;
use axum::extract::State;
use llamahub_core::{RunHandle, RunRequestOutcome, StopRunOutcome};

use crate::dto::{ALREADY_RUNNING, LlamafileNameRequest, NOT_RUNNING, OK, RunLlamafileRequest};
use crate::error::HttpError;
use crate::state::AppState;

/// Launch an artifact unless it is already running.
pub async fn run(
    State(state): State<AppState>,
    Json(req): Json<RunLlamafileRequest>,
) -> Result<Json<&'static str>, HttpError> {
    let reply = match state.manager.request_run(&req.name, req.args).await? {
        RunRequestOutcome::Started(_) => OK,
        RunRequestOutcome::AlreadyRunning(_) => ALREADY_RUNNING,
    };
    Ok(Json(reply))
}

/// Whether an artifact's process is alive.
pub async fn is_running(
    State(state): State<AppState>,
    Json(req): Json<LlamafileNameRequest>,
) -> Json<bool> {
    Json(state.manager.is_running(&req.name).await)
}

/// Stop an artifact's process.
pub async fn stop(
    State(state): State<AppState>,
    Json(req): Json<LlamafileNameRequest>,
) -> Result<Json<&'static str>, HttpError> {
    let reply = match state.manager.stop_run(&req.name).await? {
        StopRunOutcome::Stopped(_) => OK,
        StopRunOutcome::NotRunning => NOT_RUNNING,
    };
    Ok(Json(reply))
}

/// All registered runs.
pub async fn list(State(state): State<AppState>) -> Json<Vec<RunHandle>> {
    Json(state.manager.list_runs().await)
}
