//! Request lifecycle: send, stream, confirm, reset

use crate::{
    error::{Error, Result},
    state::{ConversationState, StateChange},
    view::{ChatView, ConfirmControl, MessageId, Role},
};
use futures::StreamExt;
use intake_api::{ChatBackend, ConfirmResult, OutboundMessage, StreamRecord, UserContext};
use std::time::Duration;

/// How long after a successful confirm the UI waits before offering a restart
pub const RESTART_OFFER_DELAY: Duration = Duration::from_secs(2);

const TRANSPORT_ERROR_MESSAGE: &str =
    "Sorry, something went wrong while contacting the assistant. Please try again.";
const NO_SESSION_NOTICE: &str = "No active conversation to confirm.";
const NOT_COMPLETE_NOTICE: &str = "Some details are still missing. Keep chatting to complete them.";

/// Where the controller is in the request lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Request issued, nothing received yet
    Sending,
    /// At least one record received
    StreamingReply,
    /// Transport failed; cleared back to `Idle` by `finish`
    Error,
    /// Confirmed; terminal until `reset`
    ConversationComplete,
}

/// Per-user values sent with every request
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub user_id: String,
    pub language: String,
    /// Loaded once at startup; `None` means anonymous
    pub user_context: Option<UserContext>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: "admin".to_string(),
            language: "en".to_string(),
            user_context: None,
        }
    }
}

/// Drives one conversation against a backend
pub struct SessionController {
    config: SessionConfig,
    state: ConversationState,
    phase: Phase,
    busy: bool,
    /// Assistant message receiving chunks of the current reply
    reply: Option<MessageId>,
    confirm_pending: bool,
}

impl SessionController {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: ConversationState::new(),
            phase: Phase::Idle,
            busy: false,
            reply: None,
            confirm_pending: false,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a chat request is in flight
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Current state of the confirm control
    pub fn confirm_control(&self) -> ConfirmControl {
        if self.phase == Phase::ConversationComplete {
            ConfirmControl::Hidden
        } else if self.confirm_pending {
            ConfirmControl::Pending
        } else {
            ConfirmControl::for_state(self.state.is_complete)
        }
    }

    /// Start a send.
    ///
    /// Refused without side effects while busy, after completion, or when
    /// the trimmed text is empty. On success the returned payload must be
    /// sent and the request closed with [`finish`](Self::finish).
    pub fn submit(&mut self, text: &str, view: &mut dyn ChatView) -> Result<OutboundMessage> {
        if self.busy || self.confirm_pending {
            tracing::debug!("Ignoring send while a request is in flight");
            return Err(Error::Busy);
        }
        if self.phase == Phase::ConversationComplete {
            return Err(Error::Finished);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyMessage);
        }

        self.busy = true;
        self.phase = Phase::Sending;
        self.reply = None;
        self.state.begin_reply();

        view.clear_input();
        view.set_send_enabled(false);
        view.append_message(Role::User, text);
        view.show_typing();

        Ok(
            OutboundMessage::new(text, &self.config.user_id, &self.config.language)
                .with_session(self.state.session_id.clone())
                .with_user_context(self.config.user_context.clone()),
        )
    }

    /// Apply one streamed record and update the view
    pub fn on_record(&mut self, record: StreamRecord, view: &mut dyn ChatView) {
        if self.phase == Phase::Sending {
            self.phase = Phase::StreamingReply;
            view.clear_typing();
        }

        match self.state.apply(record) {
            StateChange::TextAppended(delta) => match self.reply {
                Some(id) => view.append_text(id, &delta),
                None => self.reply = Some(view.append_message(Role::Assistant, &delta)),
            },
            StateChange::SessionAssigned => {
                tracing::debug!(session_id = ?self.state.session_id, "Session assigned");
                view.render_state(&self.state);
            }
            StateChange::ExtractionReplaced => {
                view.render_state(&self.state);
                view.set_confirm(self.confirm_control());
            }
            StateChange::StreamError(message) => {
                tracing::warn!(%message, "Service reported an error in the stream");
                // Later chunks start a fresh bubble
                self.reply = None;
                view.append_message(Role::Error, &format!("Error: {}", message));
            }
        }
    }

    /// Surface a request or stream failure
    pub fn on_transport_error(&mut self, error: &intake_api::Error, view: &mut dyn ChatView) {
        tracing::warn!(%error, "Chat request failed");
        self.phase = Phase::Error;
        view.clear_typing();
        view.append_message(
            Role::Error,
            &format!("{} ({})", TRANSPORT_ERROR_MESSAGE, error),
        );
    }

    /// Close the current request; always runs, success or not
    pub fn finish(&mut self, view: &mut dyn ChatView) {
        view.clear_typing();
        self.busy = false;
        self.reply = None;
        if self.phase != Phase::ConversationComplete {
            self.phase = Phase::Idle;
        }
        view.set_send_enabled(true);
    }

    /// Send a message and stream the whole reply
    pub async fn send(
        &mut self,
        backend: &dyn ChatBackend,
        text: &str,
        view: &mut dyn ChatView,
    ) -> Result<()> {
        let payload = self.submit(text, view)?;

        let result = self.stream_reply(backend, &payload, view).await;
        if let Err(e) = &result {
            self.on_transport_error(e, view);
        }
        self.finish(view);

        result.map_err(Error::from)
    }

    async fn stream_reply(
        &mut self,
        backend: &dyn ChatBackend,
        payload: &OutboundMessage,
        view: &mut dyn ChatView,
    ) -> intake_api::Result<()> {
        let mut records = backend.send_chat_message(payload).await?;
        while let Some(item) = records.next().await {
            self.on_record(item?, view);
        }
        Ok(())
    }

    /// Commit the collected data.
    ///
    /// Guards (busy, no session, incomplete) make no network call.
    pub async fn confirm(
        &mut self,
        backend: &dyn ChatBackend,
        view: &mut dyn ChatView,
    ) -> Result<ConfirmResult> {
        if self.busy || self.confirm_pending {
            return Err(Error::Busy);
        }
        if self.phase == Phase::ConversationComplete {
            return Err(Error::Finished);
        }
        let Some(session_id) = self.state.session_id.clone() else {
            view.notice(NO_SESSION_NOTICE);
            return Err(Error::NoSession);
        };
        if !self.state.is_complete {
            view.notice(NOT_COMPLETE_NOTICE);
            return Err(Error::NotComplete);
        }

        self.confirm_pending = true;
        view.set_confirm(ConfirmControl::Pending);
        let result = backend
            .confirm_schedule(&session_id, &self.config.user_id)
            .await;
        self.confirm_pending = false;

        match result {
            Ok(confirmed) if confirmed.success => {
                tracing::debug!(%session_id, "Conversation confirmed");
                self.phase = Phase::ConversationComplete;
                view.append_message(Role::Success, &confirm_summary(&confirmed));
                view.set_confirm(ConfirmControl::Hidden);
                Ok(confirmed)
            }
            Ok(rejected) => {
                view.append_message(
                    Role::Error,
                    &format!("Could not create the schedule: {}", rejected.message),
                );
                view.set_confirm(self.confirm_control());
                Err(Error::ConfirmRejected(rejected.message))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Confirm request failed");
                view.append_message(
                    Role::Error,
                    &format!("Could not reach the service to confirm ({}). Please try again.", e),
                );
                view.set_confirm(self.confirm_control());
                Err(e.into())
            }
        }
    }

    /// Forget the conversation and start over
    pub fn reset(&mut self, view: &mut dyn ChatView) -> Result<()> {
        if self.busy || self.confirm_pending {
            return Err(Error::Busy);
        }
        self.state = ConversationState::new();
        self.phase = Phase::Idle;
        self.reply = None;

        view.clear_typing();
        view.clear_transcript();
        view.render_state(&self.state);
        view.set_confirm(ConfirmControl::Hidden);
        view.set_send_enabled(true);
        Ok(())
    }
}

fn confirm_summary(result: &ConfirmResult) -> String {
    let mut lines = vec![if result.message.is_empty() {
        "Schedule confirmed.".to_string()
    } else {
        result.message.clone()
    }];
    if let Some(id) = &result.schedule_id {
        lines.push(format!("Schedule ID: {}", display_id(id)));
    }
    if let Some(id) = &result.config_id {
        lines.push(format!("Config ID: {}", display_id(id)));
    }
    lines.join("\n")
}

fn display_id(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
