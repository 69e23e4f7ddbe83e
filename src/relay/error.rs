//! Relay session errors

use thiserror::Error;

/// Errors from the MTProto relay session
#[derive(Error, Debug)]
pub enum RelayError {
    /// Loading, connecting or saving the session failed
    #[error("Session error: {0}")]
    Session(String),

    /// The session file holds no logged-in account
    #[error("Relay session is not authorized")]
    NotAuthorized,

    /// The destination channel is not among the session's dialogs
    #[error("Destination chat {0} not found in relay dialogs")]
    DestinationNotFound(i64),

    /// Grammers client invocation error
    #[error("MTProto client error: {0}")]
    Invocation(#[from] grammers_mtsender::InvocationError),

    /// Reading the file for upload failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
