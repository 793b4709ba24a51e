//! Model client errors.

use thiserror::Error;

/// A failed model call. Always fatal for the current run.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("response contained no candidates")]
    NoCandidates,
}
