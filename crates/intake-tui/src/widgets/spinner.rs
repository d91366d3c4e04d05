//! Animated spinner widget

use crate::theme::Theme;
use ratatui::{buffer::Buffer, layout::Rect, style::Style, text::Span, widgets::Widget};
use std::time::{Duration, Instant};

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const FRAME_DURATION: Duration = Duration::from_millis(80);

/// Frame for an animation started at `start`
pub fn frame_at(start: Instant) -> &'static str {
    let index = (start.elapsed().as_millis() / FRAME_DURATION.as_millis()) as usize;
    SPINNER_FRAMES[index % SPINNER_FRAMES.len()]
}

/// Spinner with a label, used in the status bar while a request is in flight
pub struct Spinner<'a> {
    label: &'a str,
    style: Style,
    start_time: Instant,
}

impl<'a> Spinner<'a> {
    pub fn new(label: &'a str, theme: &Theme) -> Self {
        Self {
            label,
            style: theme.accent_style(),
            start_time: Instant::now(),
        }
    }

    /// Keep the animation continuous across redraws
    pub fn with_start_time(mut self, start: Instant) -> Self {
        self.start_time = start;
        self
    }
}

impl Widget for Spinner<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 3 {
            return;
        }
        let text = format!("{} {}", frame_at(self.start_time), self.label);
        buf.set_span(area.x, area.y, &Span::styled(text, self.style), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_at_start() {
        assert_eq!(frame_at(Instant::now()), SPINNER_FRAMES[0]);
    }

    #[test]
    fn test_renders_label() {
        let theme = Theme::dark();
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);
        Spinner::new("Sending", &theme).render(area, &mut buf);
        let row: String = (0..20)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect();
        assert!(row.contains("Sending"));
    }
}
