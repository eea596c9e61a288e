// src/error.rs
use reqwest::StatusCode;
use thiserror::Error;

/// Failure taxonomy for every backend-facing operation.
///
/// Read operations surface these the same way mutating operations do, so
/// callers can always tell "empty" apart from "failed".
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server rejected request ({status}): {message}")]
    Server {
        status: StatusCode,
        message: String,
    },

    #[error("No session token available")]
    AuthMissing,

    #[error("Unexpected response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// True when the request reached the server and was explicitly refused.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Server { .. })
    }
}
