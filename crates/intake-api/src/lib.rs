//! intake-api: transport layer for the intake chat service
//!
//! This crate talks to the three service endpoints (health probe, streaming
//! chat, confirm) and turns the streamed response body into typed records.

pub mod backend;
pub mod client;
pub mod decode;
pub mod error;
pub mod stream;
pub mod types;

pub use backend::ChatBackend;
pub use client::ChatClient;
pub use decode::DecodeDiagnostic;
pub use error::{Error, Result};
pub use stream::{RecordStream, StreamRecord};
pub use types::*;
