//! Slash commands for interactive mode

mod status;

pub use status::StatusCommand;

use intake_session::SessionController;

/// Result of executing a slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Submit the collected data
    Confirm,
    /// Forget the conversation and start over
    NewConversation,
    /// Re-run the health probe
    CheckHealth,
    /// Show a message to the user (not sent to the service)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command; `None` when `input` is not a command
pub fn execute_command(input: &str, controller: &SessionController) -> Option<CommandResult> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let command = rest
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),
        "confirm" | "ok" => CommandResult::Confirm,
        "new" | "reset" | "n" => CommandResult::NewConversation,
        "health" => CommandResult::CheckHealth,
        "status" | "s" => StatusCommand::execute(controller),
        "quit" | "exit" | "q" => CommandResult::Exit,
        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /confirm             Submit the collected data
  /new                 Start a new conversation
  /status, /s          Show session, collected data and token usage
  /health              Check the chat service
  /quit, /exit, /q     Exit intake"#
        .to_string()
}
