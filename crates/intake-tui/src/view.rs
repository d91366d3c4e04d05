//! View models projected from conversation state.
//!
//! Every function here is pure: the same input always yields the same view
//! model, so redrawing after each record is safe.

use crate::labels::field_label;
use intake_api::{CollectedFields, FieldValue, HealthResult, HealthStatus, TokenUsage};
use intake_session::{ConfirmControl, ConversationState};
use std::fmt;

/// Separator for list-valued fields
pub const LIST_SEPARATOR: &str = ", ";

/// One displayed collected field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLine {
    pub label: String,
    pub value: String,
}

/// The collected-data panel
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExtractedPanel {
    /// Nothing collected yet
    #[default]
    Empty,
    Entries(Vec<FieldLine>),
}

/// Token counts shown verbatim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageLine {
    pub input: u64,
    pub output: u64,
    pub total: u64,
}

impl fmt::Display for UsageLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in │ {} out │ {} total",
            self.input, self.output, self.total
        )
    }
}

/// Color intent of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Success,
    Warning,
    Error,
}

/// Service status indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub tone: Tone,
    pub text: String,
}

impl StatusLine {
    /// Shown before the first probe completes
    pub fn checking() -> Self {
        Self {
            tone: Tone::Neutral,
            text: "Checking service...".to_string(),
        }
    }
}

/// Everything drawn in the side column
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelsView {
    pub extracted: ExtractedPanel,
    pub missing: Option<String>,
    pub usage: Option<UsageLine>,
    pub confirm: ConfirmControl,
    pub session_id: Option<String>,
}

impl PanelsView {
    /// Project the panels for a state; the confirm control follows completion
    pub fn project(state: &ConversationState) -> Self {
        Self {
            extracted: project_extracted(&state.extracted_fields),
            missing: project_missing(&state.missing_fields),
            usage: project_usage(state.token_usage.as_ref()),
            confirm: ConfirmControl::for_state(state.is_complete),
            session_id: state.session_id.clone(),
        }
    }
}

/// Render a field value as one line of text
pub fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => text.clone(),
        FieldValue::List(items) => items.join(LIST_SEPARATOR),
        FieldValue::Other(value) => match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Bool(true) => "yes".to_string(),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(LIST_SEPARATOR),
            other => other.to_string(),
        },
    }
}

/// Collected-data panel: one line per present field, in key order
pub fn project_extracted(fields: &CollectedFields) -> ExtractedPanel {
    let entries: Vec<FieldLine> = fields
        .iter()
        .filter(|(_, value)| value.is_present())
        .map(|(key, value)| FieldLine {
            label: field_label(key).to_string(),
            value: format_value(value),
        })
        .collect();

    if entries.is_empty() {
        ExtractedPanel::Empty
    } else {
        ExtractedPanel::Entries(entries)
    }
}

/// Missing-fields summary, or nothing when the list is empty
pub fn project_missing(missing: &[String]) -> Option<String> {
    if missing.is_empty() {
        return None;
    }
    let names: Vec<&str> = missing.iter().map(|key| field_label(key)).collect();
    Some(format!("Still needed: {}", names.join(LIST_SEPARATOR)))
}

pub fn project_usage(usage: Option<&TokenUsage>) -> Option<UsageLine> {
    usage.map(|u| UsageLine {
        input: u.input_tokens,
        output: u.output_tokens,
        total: u.total_tokens,
    })
}

/// Status indicator for a health probe result
pub fn project_health(health: &HealthResult) -> StatusLine {
    let descriptor = match (&health.provider, &health.model) {
        (Some(provider), Some(model)) => Some(format!("{} / {}", provider, model)),
        (Some(one), None) | (None, Some(one)) => Some(one.clone()),
        (None, None) => None,
    };

    let (tone, headline) = match health.status {
        HealthStatus::Healthy => (Tone::Success, "Connected"),
        HealthStatus::Degraded => (Tone::Warning, "Degraded"),
        HealthStatus::Unreachable => (Tone::Error, "Service unreachable"),
    };

    let mut text = headline.to_string();
    if let Some(descriptor) = descriptor {
        text.push_str(&format!(" │ {}", descriptor));
    }
    if !health.is_healthy() {
        if let Some(detail) = &health.detail {
            text.push_str(&format!(" ({})", detail));
        }
    }

    StatusLine { tone, text }
}
