//! Plain stdin/stdout mode and one-shot commands

use crate::commands::{self, CommandResult};
use intake_api::ChatClient;
use intake_session::{
    ChatView, ConfirmControl, ConversationState, MessageId, RESTART_OFFER_DELAY, Role,
    SessionConfig, SessionController,
};
use intake_tui::view::{ExtractedPanel, PanelsView, project_health};
use std::io::{self, IsTerminal, Write};

/// Line-oriented view that streams replies to stdout.
///
/// The first write error (a closed pipe, say) is kept and every later write
/// is skipped; [`print_panels`](Self::print_panels) reports it.
pub struct PlainView<W: Write> {
    out: W,
    /// Echo user messages (one-shot mode); interactive input is already on screen
    echo_user: bool,
    /// Suppress everything except notices (JSON output mode)
    quiet: bool,
    /// Whether the cursor is mid-line after streamed text
    open_line: bool,
    next_id: usize,
    panels: PanelsView,
    error: Option<io::Error>,
}

impl<W: Write> PlainView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            echo_user: false,
            quiet: false,
            open_line: false,
            next_id: 0,
            panels: PanelsView::default(),
            error: None,
        }
    }

    pub fn echo_user(mut self, echo: bool) -> Self {
        self.echo_user = echo;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn emit(&mut self, write: impl FnOnce(&mut W) -> io::Result<()>) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = write(&mut self.out).and_then(|_| self.out.flush()) {
            tracing::debug!(error = %e, "Output closed");
            self.error = Some(e);
        }
    }

    fn end_line(&mut self) {
        if self.open_line {
            self.open_line = false;
            self.emit(|out| writeln!(out));
        }
    }

    /// Take the first write error, if any
    pub fn take_error(&mut self) -> io::Result<()> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Print the collected-data summary after a reply
    pub fn print_panels(&mut self) -> io::Result<()> {
        if !self.quiet {
            self.end_line();
            let mut text = String::new();
            if let ExtractedPanel::Entries(entries) = &self.panels.extracted {
                for entry in entries {
                    text.push_str(&format!("  · {}: {}\n", entry.label, entry.value));
                }
            }
            if let Some(missing) = &self.panels.missing {
                text.push_str(&format!("  {}\n", missing));
            }
            if let Some(usage) = &self.panels.usage {
                text.push_str(&format!("  [{}]\n", usage));
            }
            if self.panels.confirm == ConfirmControl::Enabled {
                text.push_str("  All details collected. Type /confirm to submit.\n");
            }
            if !text.is_empty() {
                self.emit(|out| out.write_all(text.as_bytes()));
            }
        }
        self.take_error()
    }
}

impl<W: Write> ChatView for PlainView<W> {
    fn append_message(&mut self, role: Role, text: &str) -> MessageId {
        self.next_id += 1;
        let id = MessageId(self.next_id);
        if self.quiet || (role == Role::User && !self.echo_user) {
            return id;
        }

        self.end_line();
        match role {
            Role::User => self.emit(|out| writeln!(out, "> {}", text)),
            Role::Assistant => {
                self.open_line = true;
                self.emit(|out| write!(out, "{}", text));
            }
            Role::Error | Role::Success => self.emit(|out| writeln!(out, "{}", text)),
        }
        id
    }

    fn append_text(&mut self, _id: MessageId, text: &str) {
        if self.quiet {
            return;
        }
        self.open_line = true;
        self.emit(|out| write!(out, "{}", text));
    }

    fn show_typing(&mut self) {}

    fn clear_typing(&mut self) {}

    fn render_state(&mut self, state: &ConversationState) {
        let confirm = self.panels.confirm;
        self.panels = PanelsView::project(state);
        self.panels.confirm = confirm;
    }

    fn set_confirm(&mut self, control: ConfirmControl) {
        self.panels.confirm = control;
    }

    fn set_send_enabled(&mut self, _enabled: bool) {}

    fn clear_input(&mut self) {}

    fn notice(&mut self, text: &str) {
        self.end_line();
        eprintln!("{}", text);
    }

    fn clear_transcript(&mut self) {
        self.end_line();
    }
}

/// Probe the service and print its status; exits non-zero when not healthy
pub async fn print_health(client: &ChatClient) -> anyhow::Result<()> {
    let health = client.check_health().await;
    println!("{}", project_health(&health).text);
    if !health.is_healthy() {
        std::process::exit(1);
    }
    Ok(())
}

/// Send one message, print the reply, optionally confirm
pub async fn run_once(
    client: &ChatClient,
    config: SessionConfig,
    message: &str,
    confirm: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut controller = SessionController::new(config);
    let mut view = PlainView::new(io::stdout()).echo_user(!json).quiet(json);

    controller.send(client, message, &mut view).await?;
    view.print_panels()?;

    if confirm {
        controller.confirm(client, &mut view).await?;
        view.take_error()?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(controller.state())?);
    }
    Ok(())
}

/// Simple line-based chat loop
pub async fn run_interactive(client: &ChatClient, config: SessionConfig) -> anyhow::Result<()> {
    let mut controller = SessionController::new(config);
    let mut view = PlainView::new(io::stdout());

    if io::stderr().is_terminal() {
        eprintln!(
            "intake ({}) │ {}",
            client.base_url(),
            project_health(&client.check_health().await).text
        );
        eprintln!("Type /help for commands.");
        eprintln!();
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(result) = commands::execute_command(input, &controller) {
            match result {
                CommandResult::Confirm => {
                    if let Err(e) = controller.confirm(client, &mut view).await {
                        tracing::debug!(error = %e, "Confirm did not go through");
                    } else {
                        tokio::time::sleep(RESTART_OFFER_DELAY).await;
                        print!("\nStart a new conversation? [y/N] ");
                        io::stdout().flush()?;

                        let mut answer = String::new();
                        io::stdin().read_line(&mut answer)?;
                        if wants_restart(&answer) {
                            controller.reset(&mut view)?;
                            println!("Started a new conversation.");
                        } else {
                            println!("Type /new to start another conversation.");
                        }
                    }
                }
                CommandResult::NewConversation => {
                    controller.reset(&mut view)?;
                    println!("Started a new conversation.");
                }
                CommandResult::CheckHealth => {
                    println!("{}", project_health(&client.check_health().await).text);
                }
                CommandResult::Message(msg) => println!("{}", msg),
                CommandResult::Exit => break,
                CommandResult::Unknown(cmd) => {
                    println!("Unknown command: /{}", cmd);
                    println!("Type /help for available commands.");
                }
            }
            println!();
            continue;
        }

        match controller.send(client, input, &mut view).await {
            Ok(()) => view.print_panels()?,
            Err(intake_session::Error::Finished) => {
                println!("This conversation is confirmed. Type /new to start another.");
            }
            Err(e) => tracing::debug!(error = %e, "Send failed"),
        }
        println!();
    }

    Ok(())
}

fn wants_restart(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
