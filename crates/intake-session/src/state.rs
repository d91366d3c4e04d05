//! Conversation state and the stream reducer

use intake_api::{CollectedFields, StreamRecord, TokenUsage};
use serde::Serialize;

/// Everything the UI derives from the stream for one conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationState {
    /// Session assigned by the service, reused until a full reset
    pub session_id: Option<String>,
    /// Text of the reply currently being built
    pub assistant_text: String,
    /// Latest snapshot of collected fields
    pub extracted_fields: CollectedFields,
    /// Field keys the service still needs, in service order
    pub missing_fields: Vec<String>,
    pub is_complete: bool,
    pub token_usage: Option<TokenUsage>,
}

/// What a record changed, so the renderer can update only that
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// Text appended to the in-progress reply
    TextAppended(String),
    SessionAssigned,
    /// Fields, missing list, completion (and maybe usage) replaced
    ExtractionReplaced,
    /// In-band service error; nothing in the state changed
    StreamError(String),
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new reply; the collected data and session are kept
    pub fn begin_reply(&mut self) {
        self.assistant_text.clear();
    }

    /// Fold one record into the state.
    ///
    /// Records must be applied in arrival order. Extraction records replace
    /// the previous snapshot wholesale; they are never merged.
    pub fn apply(&mut self, record: StreamRecord) -> StateChange {
        match record {
            StreamRecord::Chunk { text } => {
                self.assistant_text.push_str(&text);
                StateChange::TextAppended(text)
            }
            StreamRecord::SessionAssigned { id } => {
                if self.session_id.as_deref().is_some_and(|current| current != id) {
                    tracing::debug!(
                        previous = self.session_id.as_deref().unwrap_or_default(),
                        new = %id,
                        "Session id reassigned"
                    );
                }
                self.session_id = Some(id);
                StateChange::SessionAssigned
            }
            StreamRecord::Extraction {
                fields,
                missing,
                complete,
                usage,
            } => {
                self.extracted_fields = fields;
                self.missing_fields = missing;
                self.is_complete = complete;
                if usage.is_some() {
                    self.token_usage = usage;
                }
                StateChange::ExtractionReplaced
            }
            StreamRecord::Error { message } => StateChange::StreamError(message),
        }
    }

    /// Whether any collected field has a value worth showing
    pub fn has_collected_data(&self) -> bool {
        self.extracted_fields.values().any(|v| v.is_present())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_api::FieldValue;

    fn extraction(fields: &[(&str, &str)], missing: &[&str], complete: bool) -> StreamRecord {
        StreamRecord::Extraction {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), FieldValue::from(*v)))
                .collect(),
            missing: missing.iter().map(|m| m.to_string()).collect(),
            complete,
            usage: None,
        }
    }

    #[test]
    fn test_chunks_concatenate_regardless_of_interleaving() {
        let chunks = ["Bon", "jour", " \u{e0} ", "tous", ""];
        let others = [
            StreamRecord::SessionAssigned { id: "s".into() },
            extraction(&[("merchant_id", "M1")], &[], false),
            StreamRecord::error("transient"),
        ];

        // Place each non-chunk record after every possible chunk position
        for position in 0..=chunks.len() {
            for other in &others {
                let mut state = ConversationState::new();
                for (i, chunk) in chunks.iter().enumerate() {
                    if i == position {
                        state.apply(other.clone());
                    }
                    state.apply(StreamRecord::chunk(*chunk));
                }
                if position == chunks.len() {
                    state.apply(other.clone());
                }
                assert_eq!(state.assistant_text, chunks.concat());
            }
        }
    }

    #[test]
    fn test_extraction_replaces_wholesale() {
        let mut state = ConversationState::new();
        state.apply(extraction(&[("merchant_id", "M1"), ("report_type", "sales")], &["date_range"], false));
        state.apply(extraction(&[], &[], false));
        assert!(state.extracted_fields.is_empty());
        assert!(!state.has_collected_data());

        state.apply(extraction(&[("frequency", "weekly")], &[], true));
        assert_eq!(state.extracted_fields.len(), 1);
        assert_eq!(
            state.extracted_fields.get("frequency"),
            Some(&FieldValue::from("weekly"))
        );
        assert!(state.missing_fields.is_empty());
        assert!(state.is_complete);
    }

    #[test]
    fn test_usage_kept_when_record_has_none() {
        let mut state = ConversationState::new();
        let usage = TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
        };
        state.apply(StreamRecord::Extraction {
            fields: Default::default(),
            missing: vec![],
            complete: false,
            usage: Some(usage),
        });
        state.apply(extraction(&[], &[], false));
        assert_eq!(state.token_usage, Some(usage));
    }

    #[test]
    fn test_later_session_assignment_wins() {
        let mut state = ConversationState::new();
        assert_eq!(
            state.apply(StreamRecord::SessionAssigned { id: "a".into() }),
            StateChange::SessionAssigned
        );
        state.apply(StreamRecord::SessionAssigned { id: "b".into() });
        assert_eq!(state.session_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_error_leaves_state_untouched() {
        let mut state = ConversationState::new();
        state.apply(StreamRecord::chunk("partial"));
        let before = state.clone();
        assert_eq!(
            state.apply(StreamRecord::error("boom")),
            StateChange::StreamError("boom".into())
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_begin_reply_keeps_session_and_fields() {
        let mut state = ConversationState::new();
        state.apply(StreamRecord::SessionAssigned { id: "s".into() });
        state.apply(StreamRecord::chunk("old reply"));
        state.apply(extraction(&[("merchant_id", "M1")], &[], false));
        state.begin_reply();
        assert!(state.assistant_text.is_empty());
        assert_eq!(state.session_id.as_deref(), Some("s"));
        assert!(state.has_collected_data());
    }
}
