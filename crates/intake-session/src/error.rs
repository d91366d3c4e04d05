//! Error types for intake-session

use thiserror::Error;

/// Result type alias using intake-session Error
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a controller action did not go through
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the transport layer
    #[error(transparent)]
    Api(#[from] intake_api::Error),

    /// A request is already in flight
    #[error("A request is already in progress")]
    Busy,

    /// Nothing to send after trimming
    #[error("Message is empty")]
    EmptyMessage,

    /// The conversation was confirmed; only a reset continues
    #[error("Conversation already confirmed")]
    Finished,

    /// Confirm attempted before the service assigned a session
    #[error("No active session")]
    NoSession,

    /// Confirm attempted before every field was collected
    #[error("Collected data is not complete")]
    NotComplete,

    /// The service declined to confirm
    #[error("Confirmation rejected: {0}")]
    ConfirmRejected(String),
}

impl Error {
    /// Whether the action was refused locally without touching the network
    pub fn is_guard(&self) -> bool {
        matches!(
            self,
            Error::Busy | Error::EmptyMessage | Error::Finished | Error::NoSession | Error::NotComplete
        )
    }
}
