//! Error types for intake-api

use thiserror::Error;

/// Result type alias using intake-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the chat service
#[derive(Error, Debug)]
pub enum Error {
    /// Network failure or body read failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with a non-success status
    #[error("Service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid client configuration (e.g. an unusable base URL)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a status error from a code and a response body
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Whether the failure happened before or while reaching the service,
    /// as opposed to the service rejecting the request.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Http(_))
    }

    /// HTTP status code, when the service answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
