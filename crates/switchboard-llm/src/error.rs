use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse failure class carried on a [`CompletionResult`](crate::CompletionResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionErrorKind {
    Timeout,
    Unavailable,
    NoModel,
    Provider,
    InvalidPayload,
}

/// Errors from the completion service boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("completion request timed out")]
    Timeout,

    #[error("completion service unavailable: {0}")]
    Unavailable(String),

    #[error("no suitable {0} model installed")]
    NoModel(String),

    #[error("completion provider failed: {0}")]
    Provider(String),

    #[error("completion provider returned an invalid payload: {0}")]
    InvalidPayload(String),
}

impl CompletionError {
    pub fn kind(&self) -> CompletionErrorKind {
        match self {
            CompletionError::Timeout => CompletionErrorKind::Timeout,
            CompletionError::Unavailable(_) => CompletionErrorKind::Unavailable,
            CompletionError::NoModel(_) => CompletionErrorKind::NoModel,
            CompletionError::Provider(_) => CompletionErrorKind::Provider,
            CompletionError::InvalidPayload(_) => CompletionErrorKind::InvalidPayload,
        }
    }
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CompletionError::Timeout
        } else if err.is_connect() {
            CompletionError::Unavailable(err.to_string())
        } else if err.is_decode() {
            CompletionError::InvalidPayload(err.to_string())
        } else {
            CompletionError::Provider(err.to_string())
        }
    }
}
