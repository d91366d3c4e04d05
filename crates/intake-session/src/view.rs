//! The surface the controller draws on

use crate::state::ConversationState;

/// Handle to a transcript message, used to append streamed text in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub usize);

/// Kind of transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    /// Failure shown inline in the transcript
    Error,
    /// Confirmation summary
    Success,
}

/// State of the confirm control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmControl {
    #[default]
    Hidden,
    Enabled,
    /// Request in flight; visible but inert
    Pending,
}

impl ConfirmControl {
    /// Visibility follows the completion flag alone
    pub fn for_state(is_complete: bool) -> Self {
        if is_complete {
            ConfirmControl::Enabled
        } else {
            ConfirmControl::Hidden
        }
    }

    pub fn is_visible(self) -> bool {
        self != ConfirmControl::Hidden
    }
}

/// Everything the controller needs from a UI.
///
/// Implementations are expected to be idempotent for `render_state` and
/// `clear_typing`: calling them twice shows the same thing as calling once.
pub trait ChatView {
    /// Append a message and return a handle to it
    fn append_message(&mut self, role: Role, text: &str) -> MessageId;

    /// Append streamed text to an existing message
    fn append_text(&mut self, id: MessageId, text: &str);

    /// Show the typing placeholder
    fn show_typing(&mut self);

    /// Remove the typing placeholder if shown
    fn clear_typing(&mut self);

    /// Redraw the collected-data, missing-fields and usage panels
    fn render_state(&mut self, state: &ConversationState);

    fn set_confirm(&mut self, control: ConfirmControl);

    fn set_send_enabled(&mut self, enabled: bool);

    fn clear_input(&mut self);

    /// Blocking notice that does not belong in the transcript
    fn notice(&mut self, text: &str);

    /// Drop every message (full reset)
    fn clear_transcript(&mut self);
}
