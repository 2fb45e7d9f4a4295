//! Runtime errors

use podium_core::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{0}")]
    InitiationFailed(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Session task is no longer running")]
    Closed,
    #[error("Session task panicked: {0}")]
    Panicked(String),
}
