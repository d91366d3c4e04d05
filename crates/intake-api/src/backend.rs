//! Backend abstraction used by the session controller

use crate::{ConfirmResult, HealthResult, OutboundMessage, RecordStream, Result};
use async_trait::async_trait;

/// The three operations the chat service offers
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Probe the service; never fails, unreachable services are a status
    async fn check_health(&self) -> HealthResult;

    /// Send one user message and stream the reply
    async fn send_chat_message(&self, payload: &OutboundMessage) -> Result<RecordStream>;

    /// Commit the collected fields of a session
    async fn confirm_schedule(&self, session_id: &str, user_id: &str) -> Result<ConfirmResult>;
}
