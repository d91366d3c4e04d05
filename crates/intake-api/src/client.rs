//! HTTP client for the chat service

use crate::{
    backend::ChatBackend,
    decode::{DecodeDiagnostic, Decoded, StreamDecoder},
    error::{Error, Result},
    stream::{RecordStream, StreamRecord},
    types::{ConfirmRequest, ConfirmResult, HealthBody, HealthResult, OutboundMessage},
};
use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::broadcast;

/// Chat service client
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    diagnostics: broadcast::Sender<DecodeDiagnostic>,
}

impl ChatClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing `reqwest::Client`
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::InvalidConfig("base URL is empty".into()));
        }
        let (diagnostics, _) = broadcast::channel(64);
        Ok(Self {
            client,
            base_url,
            diagnostics,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Subscribe to payloads the stream decoder had to drop
    pub fn subscribe_diagnostics(&self) -> broadcast::Receiver<DecodeDiagnostic> {
        self.diagnostics.subscribe()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Probe `GET /health`
    pub async fn check_health(&self) -> HealthResult {
        let url = self.url("health");
        tracing::debug!("Health probe: {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return HealthResult::unreachable(e.to_string()),
        };

        if !response.status().is_success() {
            return HealthResult::unreachable(format!("HTTP {}", response.status().as_u16()));
        }

        match response.json::<HealthBody>().await {
            Ok(body) => body.into(),
            Err(e) => HealthResult {
                status: crate::HealthStatus::Degraded,
                provider: None,
                model: None,
                detail: Some(format!("unreadable health body: {}", e)),
            },
        }
    }

    /// Send a message to `POST /chat/stream` and decode the reply as it arrives
    pub async fn send_chat_message(&self, payload: &OutboundMessage) -> Result<RecordStream> {
        let url = self.url("chat/stream");
        tracing::debug!(
            session_id = payload.session_id.as_deref().unwrap_or("-"),
            "Chat request: {}",
            url
        );

        let response = self
            .client
            .post(&url)
            .header("Accept", "text/event-stream")
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::status(status, body));
        }

        let diagnostics = self.diagnostics.clone();
        let mut body = response.bytes_stream();

        Ok(Box::pin(stream! {
            let mut decoder = StreamDecoder::new();

            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => {
                        for item in decoder.feed(&bytes) {
                            if let Some(record) = route(item, &diagnostics) {
                                yield Ok(record);
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(Error::Http(e));
                        return;
                    }
                }
            }

            for item in decoder.finish() {
                if let Some(record) = route(item, &diagnostics) {
                    yield Ok(record);
                }
            }
        }))
    }

    /// Commit a session via `POST /confirm`
    pub async fn confirm_schedule(&self, session_id: &str, user_id: &str) -> Result<ConfirmResult> {
        let url = self.url("confirm");
        tracing::debug!(session_id, "Confirm request: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&ConfirmRequest {
                session_id,
                user_id,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::status(status, body));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Pass records through; report and drop malformed payloads
fn route(item: Decoded, diagnostics: &broadcast::Sender<DecodeDiagnostic>) -> Option<StreamRecord> {
    match item {
        Decoded::Record(record) => Some(record),
        Decoded::Malformed(diagnostic) => {
            tracing::warn!(
                target: "intake_api::decode",
                payload = %diagnostic.payload,
                error = %diagnostic.error,
                "Dropping malformed stream payload"
            );
            // No subscribers is fine
            let _ = diagnostics.send(diagnostic);
            None
        }
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn check_health(&self) -> HealthResult {
        ChatClient::check_health(self).await
    }

    async fn send_chat_message(&self, payload: &OutboundMessage) -> Result<RecordStream> {
        ChatClient::send_chat_message(self, payload).await
    }

    async fn confirm_schedule(&self, session_id: &str, user_id: &str) -> Result<ConfirmResult> {
        ChatClient::confirm_schedule(self, session_id, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ChatClient::new("http://localhost:8000/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.url("health"), "http://localhost:8000/api/health");
    }

    #[test]
    fn test_empty_base_url_rejected() {
        assert!(matches!(
            ChatClient::new("  "),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_route_reports_malformed_payloads() {
        let (tx, mut rx) = broadcast::channel(4);
        let diagnostic = DecodeDiagnostic {
            payload: "{oops".into(),
            error: "EOF".into(),
        };
        assert_eq!(route(Decoded::Malformed(diagnostic.clone()), &tx), None);
        assert_eq!(rx.try_recv().unwrap(), diagnostic);

        let record = StreamRecord::chunk("hi");
        assert_eq!(route(Decoded::Record(record.clone()), &tx), Some(record));
    }
}
