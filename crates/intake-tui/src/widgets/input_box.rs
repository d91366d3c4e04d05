//! Message input widget

use crate::input::Action;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

/// Single-line message input.
///
/// The cursor is tracked in characters; scrolling is tracked in display
/// columns so wide characters stay aligned.
#[derive(Debug, Default)]
pub struct InputBox {
    content: String,
    cursor: usize,
    scroll: usize,
    placeholder: String,
    focused: bool,
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.cursor = self.content.chars().count();
        self.scroll = 0;
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
        self.scroll = 0;
    }

    fn byte_at(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn width_before(&self, char_index: usize) -> usize {
        self.content
            .chars()
            .take(char_index)
            .map(|c| c.width().unwrap_or(0))
            .sum()
    }

    /// Remove the characters in `[from, to)`
    fn remove_range(&mut self, from: usize, to: usize) {
        let start = self.byte_at(from);
        let end = self.byte_at(to);
        self.content.drain(start..end);
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_at(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    /// Apply an editing action; returns whether anything changed
    pub fn handle_action(&mut self, action: &Action, width: u16) -> bool {
        let len = self.content.chars().count();

        let changed = match action {
            Action::Char(c) => {
                self.insert_char(*c);
                true
            }
            Action::Backspace if self.cursor > 0 => {
                self.remove_range(self.cursor - 1, self.cursor);
                self.cursor -= 1;
                true
            }
            Action::Delete if self.cursor < len => {
                self.remove_range(self.cursor, self.cursor + 1);
                true
            }
            Action::Left if self.cursor > 0 => {
                self.cursor -= 1;
                true
            }
            Action::Right if self.cursor < len => {
                self.cursor += 1;
                true
            }
            Action::Home => {
                self.cursor = 0;
                true
            }
            Action::End => {
                self.cursor = len;
                true
            }
            Action::ClearLine => {
                self.clear();
                true
            }
            Action::DeleteWord => {
                let chars: Vec<char> = self.content.chars().collect();
                let mut start = self.cursor;
                while start > 0 && chars[start - 1] == ' ' {
                    start -= 1;
                }
                while start > 0 && chars[start - 1] != ' ' {
                    start -= 1;
                }
                self.remove_range(start, self.cursor);
                self.cursor = start;
                true
            }
            Action::Paste(text) => {
                // Single line: line breaks become one space
                for c in text.chars() {
                    if c == '\n' || c == '\r' {
                        if self.cursor > 0 && !self.content.ends_with(' ') {
                            self.insert_char(' ');
                        }
                    } else {
                        self.insert_char(c);
                    }
                }
                true
            }
            _ => false,
        };

        if changed {
            self.update_scroll(width as usize);
        }
        changed
    }

    fn update_scroll(&mut self, width: usize) {
        let visible = width.saturating_sub(4).max(1);
        let cursor = self.width_before(self.cursor);

        if cursor < self.scroll {
            self.scroll = cursor;
        } else if cursor >= self.scroll + visible {
            self.scroll = cursor + 1 - visible;
        }
    }

    /// The slice of content that fits in `width` columns after scrolling
    fn visible_text(&self, width: usize) -> String {
        let mut skipped = 0;
        let mut used = 0;
        let mut out = String::new();
        for c in self.content.chars() {
            let w = c.width().unwrap_or(0);
            if skipped < self.scroll {
                skipped += w;
                continue;
            }
            if used + w > width {
                break;
            }
            out.push(c);
            used += w;
        }
        out
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme, title: &str) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(if self.focused {
                theme.accent_style()
            } else {
                theme.border_style()
            });

        let inner = block.inner(area);
        block.render(area, buf);

        let (text, style) = if self.content.is_empty() {
            (self.placeholder.clone(), theme.dim_style())
        } else {
            (self.visible_text(inner.width as usize), theme.base_style())
        };
        Paragraph::new(text).style(style).render(inner, buf);

        if self.focused && inner.width > 0 {
            let x = self.width_before(self.cursor).saturating_sub(self.scroll);
            if x < inner.width as usize {
                if let Some(cell) = buf.cell_mut((inner.x + x as u16, inner.y)) {
                    cell.set_style(Style::default().bg(theme.accent));
                }
            }
        }
    }
}
