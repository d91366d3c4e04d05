//! /status command - show session info and collected data

use super::CommandResult;
use intake_session::{Phase, SessionController};
use intake_tui::view::{ExtractedPanel, project_extracted, project_missing, project_usage};

pub struct StatusCommand;

impl StatusCommand {
    pub fn execute(controller: &SessionController) -> CommandResult {
        let state = controller.state();
        let config = controller.config();

        let mut output = String::from("Session Info\n");
        output.push_str(&"-".repeat(40));
        output.push('\n');

        output.push_str(&format!(
            "Session:    {}\n",
            state.session_id.as_deref().unwrap_or("(none yet)")
        ));
        output.push_str(&format!("User:       {}\n", config.user_id));
        output.push_str(&format!("Language:   {}\n", config.language));
        output.push_str(&format!(
            "Context:    {}\n",
            if config.user_context.is_some() {
                "loaded"
            } else {
                "anonymous"
            }
        ));
        output.push_str(&format!("Phase:      {}\n", phase_name(controller.phase())));
        output.push('\n');

        match project_extracted(&state.extracted_fields) {
            ExtractedPanel::Empty => output.push_str("Collected:  nothing yet\n"),
            ExtractedPanel::Entries(entries) => {
                output.push_str("Collected:\n");
                for entry in entries {
                    output.push_str(&format!("  {}: {}\n", entry.label, entry.value));
                }
            }
        }
        if let Some(missing) = project_missing(&state.missing_fields) {
            output.push_str(&format!("{}\n", missing));
        }
        if state.is_complete {
            output.push_str("Ready to confirm: /confirm\n");
        }

        if let Some(usage) = project_usage(state.token_usage.as_ref()) {
            output.push('\n');
            output.push_str(&format!("Tokens:     {}\n", usage));
        }

        CommandResult::Message(output.trim_end().to_string())
    }
}

fn phase_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "idle",
        Phase::Sending => "sending",
        Phase::StreamingReply => "streaming",
        Phase::Error => "error",
        Phase::ConversationComplete => "confirmed",
    }
}
