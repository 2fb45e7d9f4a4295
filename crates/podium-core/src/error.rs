//! Errors raised by the session controller

use thiserror::Error;

use crate::message::Speaker;

/// Reasons a controller operation is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("A session is already active")]
    AlreadyActive,
    #[error("No active session")]
    NoSession,
    #[error("Session has ended")]
    Terminal,
    #[error("It is the {0} turn")]
    NotYourTurn(Speaker),
    #[error("Input is disabled")]
    InputDisabled,
    #[error("Argument is empty")]
    EmptyArgument,
    #[error("Remote debate id has not been assigned yet")]
    MissingRemoteId,
    #[error("Nothing to retry")]
    NothingToRetry,
}
