//! Side column: collected data, missing fields, usage and the confirm control

use crate::theme::Theme;
use crate::view::{ExtractedPanel, PanelsView};
use intake_session::ConfirmControl;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

const EMPTY_TEXT: &str = "Nothing collected yet.";

pub struct SidePanel<'a> {
    panels: &'a PanelsView,
    theme: &'a Theme,
}

impl<'a> SidePanel<'a> {
    pub fn new(panels: &'a PanelsView, theme: &'a Theme) -> Self {
        Self { panels, theme }
    }

    pub fn lines(&self) -> Vec<Line<'static>> {
        let theme = self.theme;
        let mut lines = Vec::new();

        match &self.panels.extracted {
            ExtractedPanel::Empty => {
                lines.push(Line::from(Span::styled(EMPTY_TEXT, theme.dim_style())));
            }
            ExtractedPanel::Entries(entries) => {
                for entry in entries {
                    lines.push(Line::from(vec![
                        Span::styled(format!("{}: ", entry.label), theme.accent_style()),
                        Span::styled(entry.value.clone(), theme.base_style()),
                    ]));
                }
            }
        }

        if let Some(missing) = &self.panels.missing {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                missing.clone(),
                theme.warning_style(),
            )));
        }

        match self.panels.confirm {
            ConfirmControl::Hidden => {}
            ConfirmControl::Enabled => {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "[ Confirm: Ctrl+O ]",
                    theme.success_style().add_modifier(Modifier::BOLD),
                )));
            }
            ConfirmControl::Pending => {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "[ Confirming... ]",
                    theme.dim_style(),
                )));
            }
        }

        if let Some(usage) = &self.panels.usage {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Tokens", theme.dim_style())));
            lines.push(Line::from(Span::styled(
                usage.to_string(),
                theme.dim_style(),
            )));
        }

        if let Some(session_id) = &self.panels.session_id {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Session {}", session_id),
                theme.dim_style(),
            )));
        }

        lines
    }
}

impl Widget for SidePanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(" Collected data ");

        Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}
