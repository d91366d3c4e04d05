//! Centered popup with a message and a short list of choices

use crate::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

const MAX_POPUP_WIDTH: u16 = 64;

/// Selection state for a dialog
#[derive(Debug, Default)]
pub struct DialogState {
    pub selected: usize,
    pub visible: bool,
}

impl DialogState {
    pub fn show(&mut self) {
        self.selected = 0;
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn up(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.selected = if self.selected == 0 {
            count - 1
        } else {
            self.selected - 1
        };
    }

    pub fn down(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.selected = (self.selected + 1) % count;
    }
}

/// A popup dialog: title, wrapped body text, then one line per choice
pub struct Dialog<'a> {
    title: &'a str,
    body: &'a str,
    choices: &'a [&'a str],
    selected: usize,
    theme: &'a Theme,
}

impl<'a> Dialog<'a> {
    pub fn new(title: &'a str, body: &'a str, choices: &'a [&'a str], theme: &'a Theme) -> Self {
        Self {
            title,
            body,
            choices,
            selected: 0,
            theme,
        }
    }

    pub fn with_selected(mut self, index: usize) -> Self {
        self.selected = index.min(self.choices.len().saturating_sub(1));
        self
    }

    fn popup_area(&self, area: Rect) -> Rect {
        let widest = self
            .choices
            .iter()
            .map(|c| c.chars().count() + 6)
            .chain([self.title.chars().count() + 4, self.body.chars().count() + 4])
            .max()
            .unwrap_or(20);
        let width = (widest as u16).clamp(24, MAX_POPUP_WIDTH).min(area.width);

        let body_lines = textwrap::wrap(self.body, width.saturating_sub(2).max(1) as usize).len();
        let height = (body_lines + self.choices.len() + 3) as u16;
        let height = height.min(area.height);

        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }

    pub fn render_centered(&self, area: Rect, buf: &mut Buffer) {
        let popup = self.popup_area(area);
        Clear.render(popup, buf);

        let mut lines = vec![
            Line::from(Span::styled(self.body.to_string(), self.theme.base_style())),
            Line::from(""),
        ];
        for (i, choice) in self.choices.iter().enumerate() {
            let style = if i == self.selected {
                Style::default()
                    .bg(self.theme.accent)
                    .fg(self.theme.bg)
                    .add_modifier(Modifier::BOLD)
            } else {
                self.theme.base_style()
            };
            lines.push(Line::from(Span::styled(format!("  {}", choice), style)));
        }

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(self.theme.accent_bold())
            .borders(Borders::ALL)
            .border_style(self.theme.accent_style());

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(popup, buf);
    }
}
