//! TUI implementation for intake

use crate::commands::{CommandResult, execute_command};
use crossterm::event::{Event, EventStream, KeyEventKind, MouseEventKind};
use futures::{StreamExt, future::BoxFuture};
use intake_api::{ChatClient, HealthResult, OutboundMessage, RecordStream, StreamRecord};
use intake_session::{
    ChatView, ConfirmControl, Error as SessionError, Phase, RESTART_OFFER_DELAY, Role,
    SessionConfig, SessionController,
};
use intake_tui::{
    Theme, Tui, TuiView,
    input::{Action, event_to_action},
    view::{StatusLine, Tone, project_health},
    widgets::{
        Dialog, DialogState, MessageList, SidePanel, Spinner, message_list::content_height,
    },
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use std::time::Duration;
use tokio::time::Instant;

const SIDE_PANEL_WIDTH: u16 = 38;
const RESTART_CHOICES: &[&str] = &["Start a new conversation", "Stay here"];
const NOTICE_CHOICES: &[&str] = &["OK"];

/// What the event loop should do after an input action
#[derive(Debug)]
enum Intent {
    None,
    Connect(OutboundMessage),
    Confirm,
    CheckHealth,
    Quit,
}

/// TUI application state
pub struct TuiState {
    controller: SessionController,
    view: TuiView,
    theme: Theme,
    /// Scroll offset into the transcript; `usize::MAX` follows the end
    scroll: usize,
    restart_offer: DialogState,
}

impl TuiState {
    pub fn new(config: SessionConfig, theme: Theme) -> Self {
        Self {
            controller: SessionController::new(config),
            view: TuiView::new(),
            theme,
            scroll: usize::MAX,
            restart_offer: DialogState::default(),
        }
    }

    fn show_system_message(&mut self, text: &str) {
        self.view.append_message(Role::Assistant, text);
    }

    /// Handle keyboard action
    fn handle_action(&mut self, action: Action, width: u16) -> Intent {
        // Blocking notice swallows input until dismissed
        if self.view.pending_notice().is_some() {
            if matches!(action, Action::Submit | Action::Escape) {
                self.view.dismiss_notice();
            }
            return Intent::None;
        }

        if self.restart_offer.visible {
            match action {
                Action::Up => self.restart_offer.up(RESTART_CHOICES.len()),
                Action::Down => self.restart_offer.down(RESTART_CHOICES.len()),
                Action::Submit => {
                    self.restart_offer.hide();
                    if self.restart_offer.selected == 0 {
                        self.reset();
                    }
                }
                Action::Escape => self.restart_offer.hide(),
                _ => {}
            }
            return Intent::None;
        }

        match action {
            Action::Submit => {
                let content = self.view.input.content().to_string();
                if let Some(result) = execute_command(&content, &self.controller) {
                    self.view.input.clear();
                    return self.handle_command(result);
                }
                match self.controller.submit(&content, &mut self.view) {
                    Ok(payload) => {
                        self.scroll = usize::MAX;
                        Intent::Connect(payload)
                    }
                    Err(SessionError::Finished) => {
                        self.view.notice("This conversation is confirmed. Press Ctrl+N to start a new one.");
                        Intent::None
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Send ignored");
                        Intent::None
                    }
                }
            }
            Action::Confirm => Intent::Confirm,
            Action::NewConversation => {
                self.reset();
                Intent::None
            }
            Action::Refresh => Intent::CheckHealth,
            Action::Quit | Action::Interrupt => Intent::Quit,
            Action::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
                Intent::None
            }
            Action::PageDown => {
                self.scroll = self.scroll.saturating_add(10);
                Intent::None
            }
            _ => {
                self.view.input.handle_action(&action, width);
                Intent::None
            }
        }
    }

    fn handle_command(&mut self, result: CommandResult) -> Intent {
        match result {
            CommandResult::Confirm => Intent::Confirm,
            CommandResult::NewConversation => {
                self.reset();
                Intent::None
            }
            CommandResult::CheckHealth => Intent::CheckHealth,
            CommandResult::Message(msg) => {
                self.show_system_message(&msg);
                Intent::None
            }
            CommandResult::Exit => Intent::Quit,
            CommandResult::Unknown(cmd) => {
                self.show_system_message(&format!(
                    "Unknown command: /{}\nType /help for available commands.",
                    cmd
                ));
                Intent::None
            }
        }
    }

    fn reset(&mut self) {
        match self.controller.reset(&mut self.view) {
            Ok(()) => {
                self.restart_offer.hide();
                self.scroll = usize::MAX;
            }
            Err(e) => tracing::debug!(error = %e, "Reset ignored"),
        }
    }

    /// Apply one item of the reply stream; returns whether the stream is done
    fn on_stream_item(&mut self, item: Option<intake_api::Result<StreamRecord>>) -> bool {
        match item {
            Some(Ok(record)) => {
                self.controller.on_record(record, &mut self.view);
                false
            }
            Some(Err(e)) => {
                self.controller.on_transport_error(&e, &mut self.view);
                self.controller.finish(&mut self.view);
                true
            }
            None => {
                self.controller.finish(&mut self.view);
                true
            }
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        self.scroll = if delta < 0 {
            self.scroll.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll.saturating_add(delta as usize)
        };
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(30), Constraint::Length(SIDE_PANEL_WIDTH)])
            .split(size);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // Messages
                Constraint::Length(1), // Status
                Constraint::Length(3), // Input
            ])
            .split(columns[0]);

        self.render_messages(frame, rows[0]);
        self.render_status(frame, rows[1]);

        let title = if self.view.send_enabled() {
            " Message "
        } else {
            " Message (waiting for reply) "
        };
        self.view
            .input
            .render(rows[2], frame.buffer_mut(), &self.theme, title);

        frame.render_widget(SidePanel::new(&self.view.panels, &self.theme), columns[1]);

        if self.restart_offer.visible {
            Dialog::new(
                "Schedule confirmed",
                "Start a brand-new conversation?",
                RESTART_CHOICES,
                &self.theme,
            )
            .with_selected(self.restart_offer.selected)
            .render_centered(size, frame.buffer_mut());
        }

        if let Some(notice) = self.view.pending_notice() {
            Dialog::new("Notice", notice, NOTICE_CHOICES, &self.theme)
                .render_centered(size, frame.buffer_mut());
        }
    }

    fn render_messages(&mut self, frame: &mut Frame, area: Rect) {
        let title = format!(" intake │ {} ", self.controller.config().user_id);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(title);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.view.transcript.take_follow() {
            self.scroll = usize::MAX;
        }

        if self.view.transcript.is_empty() && !self.view.transcript.is_typing() {
            frame.render_widget(welcome(&self.theme), inner);
            return;
        }

        let typing = self.view.transcript.is_typing();
        let height = content_height(self.view.transcript.messages(), typing, inner.width as usize);
        let max_scroll = height.saturating_sub(inner.height as usize);
        self.scroll = self.scroll.min(max_scroll);

        let list = MessageList::new(self.view.transcript.messages(), &self.theme)
            .typing(typing.then(|| self.view.typing_since()))
            .scroll(self.scroll);
        frame.render_widget(list, inner);

        if height > inner.height as usize {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");

            let mut scrollbar_state = ScrollbarState::new(height)
                .position(self.scroll)
                .viewport_content_length(inner.height as usize);

            frame.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        if self.controller.is_busy() {
            let label = match self.controller.phase() {
                Phase::StreamingReply => "Receiving reply...",
                _ => "Sending...",
            };
            let spinner = Spinner::new(label, &self.theme)
                .with_start_time(self.view.typing_since());
            frame.render_widget(spinner, area);
            return;
        }

        let left = &self.view.status.text;
        let right = "Ctrl+O: confirm │ Ctrl+N: new │ Ctrl+C: quit";
        let available = area.width as usize;
        let used = left.chars().count() + right.chars().count();

        let line = if used + 2 <= available {
            Line::from(vec![
                Span::styled(left.as_str(), self.theme.tone_style(self.view.status.tone)),
                Span::raw(" ".repeat(available - used)),
                Span::styled(right, self.theme.dim_style()),
            ])
        } else {
            Line::from(Span::styled(
                left.as_str(),
                self.theme.tone_style(self.view.status.tone),
            ))
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn welcome(theme: &Theme) -> Paragraph<'static> {
    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("    {:<10}", k), theme.accent_style()),
            Span::styled(what, theme.base_style()),
        ])
    };
    Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("  intake", theme.accent_bold())),
        Line::from(Span::styled(
            "  Describe the report you need; the assistant collects the details.",
            theme.dim_style(),
        )),
        Line::from(""),
        Line::from(Span::styled("  Keybindings", theme.warning_style())),
        Line::from(""),
        key("Enter", "Send message"),
        key("Ctrl+O", "Confirm collected data"),
        key("Ctrl+N", "New conversation"),
        key("Ctrl+R", "Check service"),
        key("PgUp/Dn", "Scroll history"),
        key("Ctrl+C", "Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "  Type /help for commands.",
            theme.dim_style(),
        )),
    ])
}

/// Wait on an optional future; pending forever when there is none
async fn poll_slot<T>(slot: &mut Option<BoxFuture<'_, T>>) -> T {
    match slot {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

async fn next_record(
    records: &mut Option<RecordStream>,
) -> Option<intake_api::Result<StreamRecord>> {
    match records {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn probe(client: &ChatClient) -> BoxFuture<'_, HealthResult> {
    Box::pin(client.check_health())
}

/// Run the TUI application
pub async fn run_tui(client: &ChatClient, config: SessionConfig, theme: Theme) -> anyhow::Result<()> {
    let mut tui = Tui::enter()?;
    let mut state = TuiState::new(config, theme);

    let mut events = EventStream::new();
    let mut tick_interval = tokio::time::interval(Duration::from_millis(80));

    let mut connecting: Option<BoxFuture<'_, intake_api::Result<RecordStream>>> = None;
    let mut records: Option<RecordStream> = None;
    let mut probing: Option<BoxFuture<'_, HealthResult>> = Some(probe(client));
    let mut restart_at: Option<Instant> = None;
    let mut diagnostics = client.subscribe_diagnostics();

    loop {
        tui.draw(|frame| state.render(frame))?;
        let width = tui.width()?;

        let intent = tokio::select! {
            result = poll_slot(&mut connecting) => {
                connecting = None;
                match result {
                    Ok(stream) => records = Some(stream),
                    Err(e) => {
                        state.controller.on_transport_error(&e, &mut state.view);
                        state.controller.finish(&mut state.view);
                    }
                }
                Intent::None
            }

            item = next_record(&mut records) => {
                if state.on_stream_item(item) {
                    records = None;
                }
                Intent::None
            }

            health = poll_slot(&mut probing) => {
                probing = None;
                state.view.set_status(project_health(&health));
                Intent::None
            }

            Ok(diagnostic) = diagnostics.recv() => {
                state.view.set_status(StatusLine {
                    tone: Tone::Warning,
                    text: format!("Skipped malformed stream data: {}", diagnostic.error),
                });
                Intent::None
            }

            _ = wait_until(restart_at) => {
                restart_at = None;
                if state.controller.phase() == Phase::ConversationComplete {
                    state.restart_offer.show();
                }
                Intent::None
            }

            event = events.next() => {
                match event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Release => Intent::None,
                    Some(Ok(Event::Mouse(mouse))) => {
                        match mouse.kind {
                            MouseEventKind::ScrollUp => state.scroll_by(-3),
                            MouseEventKind::ScrollDown => state.scroll_by(3),
                            _ => {}
                        }
                        Intent::None
                    }
                    Some(Ok(event)) => match event_to_action(event) {
                        Some(action) => state.handle_action(action, width),
                        None => Intent::None,
                    },
                    Some(Err(e)) => {
                        return Err(anyhow::anyhow!("Event error: {}", e));
                    }
                    None => Intent::Quit,
                }
            }

            // Tick for animations (spinner updates)
            _ = tick_interval.tick() => Intent::None,
        };

        match intent {
            Intent::None => {}
            Intent::Quit => break,
            Intent::Connect(payload) => {
                connecting = Some(Box::pin(async move { client.send_chat_message(&payload).await }));
            }
            Intent::CheckHealth => {
                state.view.set_status(StatusLine::checking());
                probing = Some(probe(client));
            }
            Intent::Confirm => {
                // The confirm request runs inline; draw the pending control first
                let ready = state.controller.confirm_control() == ConfirmControl::Enabled
                    && state.controller.state().session_id.is_some()
                    && !state.controller.is_busy();
                if ready {
                    state.view.set_confirm(ConfirmControl::Pending);
                    tui.draw(|frame| state.render(frame))?;
                }
                match state.controller.confirm(client, &mut state.view).await {
                    Ok(_) => restart_at = Some(Instant::now() + RESTART_OFFER_DELAY),
                    Err(e) => tracing::debug!(error = %e, "Confirm did not go through"),
                }
            }
        }
    }

    Ok(())
}
