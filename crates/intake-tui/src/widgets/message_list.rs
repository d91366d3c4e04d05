//! Message list widget for displaying the transcript

use crate::theme::Theme;
use crate::transcript::ChatMessage;
use crate::widgets::spinner::frame_at;
use intake_session::Role;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use std::time::Instant;

/// Widget for displaying a list of chat messages
pub struct MessageList<'a> {
    messages: &'a [ChatMessage],
    theme: &'a Theme,
    scroll: usize,
    /// Start of the typing placeholder, if shown
    typing: Option<Instant>,
}

impl<'a> MessageList<'a> {
    pub fn new(messages: &'a [ChatMessage], theme: &'a Theme) -> Self {
        Self {
            messages,
            theme,
            scroll: 0,
            typing: None,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Show the typing placeholder after the last message
    pub fn typing(mut self, since: Option<Instant>) -> Self {
        self.typing = since;
        self
    }

    fn header(&self, msg: &ChatMessage) -> (String, Style) {
        let (label, style) = match msg.role {
            Role::User => ("▶ You", self.theme.accent_bold()),
            Role::Assistant => ("◀ Assistant", self.theme.assistant_bold()),
            Role::Error => ("✗ Error", self.theme.error_style()),
            Role::Success => ("✓ Confirmed", self.theme.success_style()),
        };
        (format!("{} · {}", label, msg.at.format("%H:%M")), style)
    }

    fn body_style(&self, role: Role) -> Style {
        match role {
            Role::Error => self.theme.error_style(),
            Role::Success => self.theme.success_style(),
            Role::User | Role::Assistant => self.theme.base_style(),
        }
    }

    /// Lay out every message at `width` columns
    pub fn lines(&self, width: usize) -> Vec<Line<'static>> {
        let content_width = width.saturating_sub(2).max(1);
        let mut lines = Vec::new();

        for msg in self.messages {
            let (header, style) = self.header(msg);
            lines.push(Line::from(Span::styled(header, style)));

            let body_style = self.body_style(msg.role);
            for line in textwrap::wrap(&msg.content, content_width) {
                lines.push(Line::from(Span::styled(format!("  {}", line), body_style)));
            }
            lines.push(Line::from(""));
        }

        if let Some(since) = self.typing {
            lines.push(Line::from(Span::styled(
                format!("  {} Assistant is typing...", frame_at(since)),
                self.theme.warning_style(),
            )));
        }

        lines
    }
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let visible: Vec<Line> = self
            .lines(area.width as usize)
            .into_iter()
            .skip(self.scroll)
            .take(area.height as usize)
            .collect();

        Paragraph::new(visible).render(area, buf);
    }
}

/// Total height of the laid-out transcript
pub fn content_height(messages: &[ChatMessage], typing: bool, width: usize) -> usize {
    let content_width = width.saturating_sub(2).max(1);
    let body: usize = messages
        .iter()
        .map(|msg| 2 + textwrap::wrap(&msg.content, content_width).len())
        .sum();
    body + usize::from(typing)
}
