//! Errors surfaced by the solve service boundary.

use std::time::Duration;

use thiserror::Error;

/// Why a solve request failed before producing steps.
#[derive(Debug, Error)]
pub enum SolveError {
    /// Missing, empty or oversized image payload. No model call was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The upstream call failed (network, credentials, non-2xx status).
    #[error("model request failed: {0:#}")]
    ModelRequest(#[source] anyhow::Error),

    #[error("model request timed out after {0:?}")]
    ModelTimeout(Duration),

    /// Model output was absent or did not match the schema (strict mode only).
    #[error("unusable model output: {0}")]
    ModelOutput(String),
}

impl SolveError {
    /// Stable machine-readable kind, used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            SolveError::InvalidInput(_) => "invalid_input",
            SolveError::ModelRequest(_) => "model_request",
            SolveError::ModelTimeout(_) => "model_timeout",
            SolveError::ModelOutput(_) => "model_output",
        }
    }

    /// Whether resubmitting the same image may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SolveError::ModelRequest(_) | SolveError::ModelTimeout(_) | SolveError::ModelOutput(_)
        )
    }
}
