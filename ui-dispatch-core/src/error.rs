//! Error types for the fallible seams of the interpreter
//!
//! None of these escape a dispatch: action and fetch failures are written to
//! the `<key>_error` companion entry instead.

use thiserror::Error;

/// Failure to read a configuration tree.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a remote call.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("API call failed: {status} {reason}")]
    Status { status: u16, reason: String },
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Failure of a single action link.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{kind} action has no target")]
    MissingTarget { kind: &'static str },
    #[error("invalid api params: {0}")]
    InvalidApiConfig(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
