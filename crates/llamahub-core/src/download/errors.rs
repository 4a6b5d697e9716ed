//! Download error types.
//!
//! Failures happen after `request_download` has already returned, so they
//! are stored on the handle and served to pollers. That requires the error
//! to be `Clone` and serializable, which rules out holding `std::io::Error`
//! or `reqwest::Error` directly; their kind and message are captured as
//! strings instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a transfer stopped before end of stream.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DownloadError {
    /// Opening or writing the target file failed.
    #[error("I/O error ({io_kind}): {message}")]
    Io {
        /// The `std::io::ErrorKind`, debug-formatted.
        io_kind: String,
        /// Detailed error message.
        message: String,
    },

    /// The request failed, the server answered with a non-success status,
    /// or the body stream broke off.
    #[error("Network error: {message}")]
    Network {
        /// Detailed error message.
        message: String,
        /// HTTP status code if the server answered.
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },
}

impl DownloadError {
    /// Create an I/O error from a `std::io::Error`.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        Self::Io {
            io_kind: format!("{:?}", err.kind()),
            message: err.to_string(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a network error with HTTP status code.
    pub fn network_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Network {
            message: message.into(),
            status_code: Some(status_code),
        }
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io_error(&err)
    }
}
