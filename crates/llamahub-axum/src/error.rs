//! Axum-specific error types and mappings.
//!
//! Maps `CoreError` and `ProcessError` to HTTP status codes and JSON bodies
//! carrying a stable `type` discriminant.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use llamahub_core::{CoreError, ProcessError};
use serde::Serialize;
use thiserror::Error;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The name cannot be an artifact.
    #[error("{0}")]
    InvalidArtifactName(String),

    /// No artifact with this name is on disk.
    #[error("{0}")]
    ArtifactNotFound(String),

    /// No download was ever requested for this name.
    #[error("No download recorded for {0}")]
    DownloadNotFound(String),

    /// The artifact is still downloading.
    #[error("{0}")]
    ArtifactBusy(String),

    /// The artifacts directory is missing or unreadable.
    #[error("{0}")]
    StorageUnavailable(String),

    /// The OS refused to start the artifact.
    #[error("{0}")]
    LaunchFailed(String),

    /// Terminating or reaping the process failed.
    #[error("{0}")]
    StopFailed(String),
}

impl HttpError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidArtifactName(_) => StatusCode::BAD_REQUEST,
            Self::ArtifactNotFound(_) | Self::DownloadNotFound(_) => StatusCode::NOT_FOUND,
            Self::ArtifactBusy(_) => StatusCode::CONFLICT,
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::LaunchFailed(_) | Self::StopFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error type discriminant for client-side handling.
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidArtifactName(_) => "INVALID_ARTIFACT_NAME",
            Self::ArtifactNotFound(_) => "ARTIFACT_NOT_FOUND",
            Self::DownloadNotFound(_) => "DOWNLOAD_NOT_FOUND",
            Self::ArtifactBusy(_) => "ARTIFACT_BUSY",
            Self::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            Self::LaunchFailed(_) => "LAUNCH_FAILED",
            Self::StopFailed(_) => "STOP_FAILED",
        }
    }
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
    #[serde(rename = "type")]
    error_type: &'static str,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, error_type = self.error_type(), "Request failed");
        }

        let body = ErrorBody {
            error: self.to_string(),
            status: status.as_u16(),
            error_type: self.error_type(),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<CoreError> for HttpError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::StorageUnavailable { .. } => Self::StorageUnavailable(err.to_string()),
            CoreError::InvalidArtifactName(_) => Self::InvalidArtifactName(err.to_string()),
            CoreError::ArtifactNotFound(_) => Self::ArtifactNotFound(err.to_string()),
            CoreError::ArtifactBusy(_) => Self::ArtifactBusy(err.to_string()),
            CoreError::Process(proc_err) => proc_err.into(),
        }
    }
}

impl From<ProcessError> for HttpError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::ArtifactNotFound { .. } => Self::ArtifactNotFound(err.to_string()),
            ProcessError::LaunchFailed { .. } => Self::LaunchFailed(err.to_string()),
            ProcessError::StopFailed(_) => Self::StopFailed(err.to_string()),
        }
    }
}
