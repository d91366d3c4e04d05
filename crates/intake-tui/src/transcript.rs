//! Transcript of chat bubbles

use chrono::{DateTime, Local};
use intake_session::{MessageId, Role};

/// A single bubble in the transcript
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// When the bubble was opened
    pub at: DateTime<Local>,
}

/// Ordered list of bubbles plus the typing placeholder.
///
/// Handles stay valid until [`clear`](Transcript::clear); appending through a
/// handle only touches that one bubble.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    typing: bool,
    /// Set by any structural change; the widget scrolls to the end and resets it
    follow: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new bubble and return its handle
    pub fn push(&mut self, role: Role, content: &str) -> MessageId {
        self.messages.push(ChatMessage {
            role,
            content: content.to_string(),
            at: Local::now(),
        });
        self.follow = true;
        MessageId(self.messages.len() - 1)
    }

    /// Append text to a bubble; stale handles are ignored
    pub fn append(&mut self, id: MessageId, text: &str) {
        if let Some(message) = self.messages.get_mut(id.0) {
            message.content.push_str(text);
            self.follow = true;
        }
    }

    pub fn show_typing(&mut self) {
        self.typing = true;
        self.follow = true;
    }

    /// Remove the placeholder; returns whether it was shown
    pub fn clear_typing(&mut self) -> bool {
        std::mem::replace(&mut self.typing, false)
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.typing = false;
        self.follow = true;
    }

    /// Take the pending scroll-to-end request
    pub fn take_follow(&mut self) -> bool {
        std::mem::replace(&mut self.follow, false)
    }
}
