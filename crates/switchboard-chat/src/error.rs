//! Error types for the chat layer.
//!
//! Turn handling itself never fails; these cover session lookup and
//! attachment intake around it.

use switchboard_core::SwitchboardError;

/// Errors from session management and attachment intake.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("session key cannot be empty")]
    EmptySessionKey,
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error(transparent)]
    Core(#[from] SwitchboardError),
}
