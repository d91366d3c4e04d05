//! Streaming record types

use crate::error::Result;
use crate::types::{CollectedFields, TokenUsage};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// One decoded record of the chat stream.
///
/// A single `data:` payload may produce several records; they are emitted
/// in the order `SessionAssigned`, `Chunk`, `Extraction`, `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamRecord {
    /// Incremental assistant text
    Chunk { text: String },
    /// Session id assigned by the service
    SessionAssigned { id: String },
    /// Snapshot of everything extracted so far
    Extraction {
        fields: CollectedFields,
        missing: Vec<String>,
        complete: bool,
        usage: Option<TokenUsage>,
    },
    /// Service-side failure reported in-band
    Error { message: String },
}

impl StreamRecord {
    /// Create a chunk record
    pub fn chunk(text: impl Into<String>) -> Self {
        Self::Chunk { text: text.into() }
    }

    /// Create an error record
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Text carried by a chunk record
    pub fn as_chunk(&self) -> Option<&str> {
        match self {
            Self::Chunk { text } => Some(text),
            _ => None,
        }
    }
}

/// A stream of decoded records; ends when the service closes the body.
///
/// Body read failures are yielded as `Err` and end the stream.
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<StreamRecord>> + Send>>;
