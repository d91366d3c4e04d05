//! `ChatView` adapter backed by terminal widgets

use crate::{
    transcript::Transcript,
    view::{PanelsView, StatusLine},
    widgets::InputBox,
};
use intake_session::{ChatView, ConfirmControl, ConversationState, MessageId, Role};
use std::time::Instant;

/// Terminal-side view state the controller draws on
pub struct TuiView {
    pub transcript: Transcript,
    pub panels: PanelsView,
    pub input: InputBox,
    pub status: StatusLine,
    send_enabled: bool,
    /// Blocking notice; dismissed by the user
    notice: Option<String>,
    /// Spinner start for the typing placeholder
    typing_since: Instant,
}

impl Default for TuiView {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiView {
    pub fn new() -> Self {
        let mut input = InputBox::new().with_placeholder("Type a message...");
        input.set_focused(true);
        Self {
            transcript: Transcript::new(),
            panels: PanelsView::default(),
            input,
            status: StatusLine::checking(),
            send_enabled: true,
            notice: None,
            typing_since: Instant::now(),
        }
    }

    pub fn send_enabled(&self) -> bool {
        self.send_enabled
    }

    pub fn pending_notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn typing_since(&self) -> Instant {
        self.typing_since
    }

    pub fn set_status(&mut self, status: StatusLine) {
        self.status = status;
    }
}

impl ChatView for TuiView {
    fn append_message(&mut self, role: Role, text: &str) -> MessageId {
        self.transcript.push(role, text)
    }

    fn append_text(&mut self, id: MessageId, text: &str) {
        self.transcript.append(id, text);
    }

    fn show_typing(&mut self) {
        self.typing_since = Instant::now();
        self.transcript.show_typing();
    }

    fn clear_typing(&mut self) {
        self.transcript.clear_typing();
    }

    fn render_state(&mut self, state: &ConversationState) {
        // Keep the controller's confirm state; only the data panels are projected
        let confirm = self.panels.confirm;
        self.panels = PanelsView::project(state);
        self.panels.confirm = confirm;
    }

    fn set_confirm(&mut self, control: ConfirmControl) {
        self.panels.confirm = control;
    }

    fn set_send_enabled(&mut self, enabled: bool) {
        self.send_enabled = enabled;
        self.input.set_focused(enabled);
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }

    fn notice(&mut self, text: &str) {
        self.notice = Some(text.to_string());
    }

    fn clear_transcript(&mut self) {
        self.transcript.clear();
    }
}
