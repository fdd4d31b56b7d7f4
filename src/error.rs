//! Error types for lotto-history
//!
//! Errors fall into three families:
//! - transport failures talking to the lottery service
//! - responses that are not the structured data we expect
//! - local I/O while writing the output artifacts
//!
//! Per-draw failures never surface as [`Error`] to the caller of a harvest;
//! they are folded into a [`FetchFailure`](crate::types::FetchFailure) and
//! recorded alongside the successes.

use thiserror::Error;

use crate::types::{FailureKind, FetchFailure};

/// Result type alias for lotto-history operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for lotto-history
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "worker_count")
        key: Option<String>,
    },

    /// Network unreachable, timeout, or non-success HTTP status
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body is not structured data, or lacks a required field
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding error while writing the tabular artifact
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error while writing a JSON artifact
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Classify this error for a per-draw failure record.
    ///
    /// Only transport and parse errors can come out of a draw fetch; anything
    /// else is reported as a transport-level problem.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::MalformedResponse(_) | Error::Serialization(_) => {
                FailureKind::MalformedResponse
            }
            _ => FailureKind::Transport,
        }
    }
}

impl From<Error> for FetchFailure {
    fn from(error: Error) -> Self {
        FetchFailure::new(error.failure_kind(), error.to_string())
    }
}
