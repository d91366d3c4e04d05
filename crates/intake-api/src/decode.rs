//! Incremental decoding of the chat response body
//!
//! The body is a sequence of text lines. Only `data:` lines matter: each one
//! carries a JSON object that is turned into zero or more [`StreamRecord`]s.
//! Bytes may arrive split anywhere, including inside a UTF-8 sequence or in
//! the middle of a line, so both layers keep state between reads.

use crate::stream::StreamRecord;
use crate::types::{CollectedFields, TokenUsage};
use serde_json::{Map, Value};

/// Incremental UTF-8 decoder that carries incomplete sequences across reads
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next slice of bytes.
    ///
    /// A multi-byte character cut at the end of `bytes` is held back until
    /// the rest arrives. Invalid sequences become U+FFFD.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        None => {
                            rest = tail;
                            break;
                        }
                    }
                }
            }
        }

        let keep = rest.len();
        let start = self.pending.len() - keep;
        self.pending.drain(..start);
        out
    }

    /// Flush whatever is left at end of stream
    pub fn finish(&mut self) -> String {
        let out = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        out
    }

    /// Whether bytes are being held back
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// A single line of the body, classified by prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamLine<'a> {
    /// Blank line
    Empty,
    /// `event:` line; reserved, currently ignored
    Event(&'a str),
    /// `data:` line with its trimmed payload
    Data(&'a str),
    /// Anything else (comments, unknown fields)
    Other(&'a str),
}

/// Classify one line (without its terminator)
pub fn classify_line(line: &str) -> StreamLine<'_> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return StreamLine::Empty;
    }
    if let Some(rest) = line.strip_prefix("event:") {
        return StreamLine::Event(rest.trim());
    }
    if let Some(rest) = line.strip_prefix("data:") {
        return StreamLine::Data(rest.trim());
    }
    StreamLine::Other(line)
}

/// A `data:` payload, or one key of it, that could not be decoded.
///
/// Unparseable payloads are dropped whole. An ill-typed key is dropped on
/// its own and the rest of the payload still yields records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeDiagnostic {
    /// The offending payload text
    pub payload: String,
    /// Parser error message
    pub error: String,
}

/// Output of the decoder, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Record(StreamRecord),
    Malformed(DecodeDiagnostic),
}

/// JSON object carried on a `data:` line; every key is optional and read
/// independently of the others
struct PayloadReader<'a> {
    payload: &'a str,
    object: Map<String, Value>,
    problems: Vec<DecodeDiagnostic>,
}

impl<'a> PayloadReader<'a> {
    fn new(payload: &'a str, object: Map<String, Value>) -> Self {
        Self {
            payload,
            object,
            problems: Vec::new(),
        }
    }

    /// Remove a key; `null` counts as absent
    fn take(&mut self, key: &str) -> Option<Value> {
        self.object.remove(key).filter(|v| !v.is_null())
    }

    fn reject(&mut self, key: &str, error: impl std::fmt::Display) {
        self.problems.push(DecodeDiagnostic {
            payload: self.payload.to_string(),
            error: format!("{}: {}", key, error),
        });
    }

    fn session_id(&mut self) -> Option<String> {
        match self.take("session_id")? {
            Value::String(id) => Some(id),
            Value::Number(id) => Some(id.to_string()),
            other => {
                self.reject("session_id", format_args!("expected a string, found {}", other));
                None
            }
        }
    }

    fn chunk(&mut self) -> Option<String> {
        match self.take("chunk")? {
            Value::String(text) => Some(text),
            other => {
                self.reject("chunk", format_args!("expected a string, found {}", other));
                None
            }
        }
    }

    fn collected_data(&mut self) -> Option<CollectedFields> {
        let value = self.take("collected_data")?;
        if !value.is_object() {
            self.reject("collected_data", format_args!("expected an object, found {}", value));
            return None;
        }
        match serde_json::from_value(value) {
            Ok(fields) => Some(fields),
            Err(e) => {
                self.reject("collected_data", e);
                None
            }
        }
    }

    /// Field names; entries that are not strings are skipped
    fn missing_fields(&mut self) -> Vec<String> {
        match self.take("missing_fields") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(name) => Some(name),
                    _ => None,
                })
                .collect(),
            Some(other) => {
                self.reject("missing_fields", format_args!("expected an array, found {}", other));
                Vec::new()
            }
        }
    }

    fn is_complete(&mut self) -> bool {
        match self.take("is_complete") {
            None => false,
            Some(Value::Bool(complete)) => complete,
            Some(other) => {
                self.reject("is_complete", format_args!("expected a boolean, found {}", other));
                false
            }
        }
    }

    fn token_usage(&mut self) -> Option<TokenUsage> {
        let value = self.take("token_usage")?;
        if !value.is_object() {
            self.reject("token_usage", format_args!("expected an object, found {}", value));
            return None;
        }
        match serde_json::from_value(value) {
            Ok(usage) => Some(usage),
            Err(e) => {
                self.reject("token_usage", e);
                None
            }
        }
    }

    fn error(&mut self) -> Option<String> {
        match self.take("error")? {
            Value::String(message) => Some(message),
            other => Some(
                other
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| other.to_string()),
            ),
        }
    }

    /// Records in fixed order, followed by one diagnostic per rejected key
    fn into_decoded(mut self) -> Vec<Decoded> {
        let mut records = Vec::new();

        if let Some(id) = self.session_id() {
            records.push(StreamRecord::SessionAssigned { id });
        }

        // An empty chunk carries nothing to append
        if let Some(text) = self.chunk().filter(|t| !t.is_empty()) {
            records.push(StreamRecord::Chunk { text });
        }

        // Read every key even without collected data so bad ones are reported
        let fields = self.collected_data();
        let missing = self.missing_fields();
        let complete = self.is_complete();
        let usage = self.token_usage();
        if let Some(fields) = fields {
            records.push(StreamRecord::Extraction {
                fields,
                missing,
                complete,
                usage,
            });
        }

        if let Some(message) = self.error() {
            records.push(StreamRecord::Error { message });
        }

        records
            .into_iter()
            .map(Decoded::Record)
            .chain(self.problems.into_iter().map(Decoded::Malformed))
            .collect()
    }
}

/// Decode the payload of one `data:` line
pub fn decode_payload(payload: &str) -> Vec<Decoded> {
    let malformed = |error: String| {
        vec![Decoded::Malformed(DecodeDiagnostic {
            payload: payload.to_string(),
            error,
        })]
    };

    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(object)) => PayloadReader::new(payload, object).into_decoded(),
        Ok(other) => malformed(format!("expected a JSON object, found {}", other)),
        Err(e) => malformed(e.to_string()),
    }
}

/// Decode one complete line
pub fn decode_line(line: &str) -> Vec<Decoded> {
    match classify_line(line) {
        StreamLine::Data(payload) => decode_payload(payload),
        StreamLine::Empty | StreamLine::Event(_) | StreamLine::Other(_) => Vec::new(),
    }
}

/// Stateful decoder from raw body bytes to [`Decoded`] items
#[derive(Debug, Default)]
pub struct StreamDecoder {
    utf8: Utf8Decoder,
    buffer: String,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next slice of body bytes, returning every item completed by it
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Decoded> {
        let text = self.utf8.decode(bytes);
        self.buffer.push_str(&text);
        self.drain_lines()
    }

    /// Signal end of body; the unterminated tail is decoded as a last line
    pub fn finish(&mut self) -> Vec<Decoded> {
        let tail = self.utf8.finish();
        self.buffer.push_str(&tail);
        let mut out = self.drain_lines();
        if !self.buffer.is_empty() {
            let last = std::mem::take(&mut self.buffer);
            out.extend(decode_line(&last));
        }
        out
    }

    fn drain_lines(&mut self) -> Vec<Decoded> {
        let mut out = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.buffer[start..].find('\n') {
            out.extend(decode_line(&self.buffer[start..start + pos]));
            start += pos + 1;
        }
        self.buffer.drain(..start);
        out
    }
}

/// Decode a whole body at once
pub fn decode_all(body: &[u8]) -> Vec<Decoded> {
    let mut decoder = StreamDecoder::new();
    let mut out = decoder.feed(body);
    out.extend(decoder.finish());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldValue;

    fn records(items: Vec<Decoded>) -> Vec<StreamRecord> {
        items
            .into_iter()
            .filter_map(|d| match d {
                Decoded::Record(r) => Some(r),
                Decoded::Malformed(_) => None,
            })
            .collect()
    }

    const BODY: &str = concat!(
        "event: message\n",
        "data: {\"session_id\":\"s-1\"}\n",
        "\n",
        "data: {\"chunk\":\"Bonjour, \u{e9}t\u{e9} \"}\n",
        "data: {\"chunk\":\"\u{65e5}\u{672c} \u{1f4c5}\"}\r\n",
        "data: not json\n",
        "data: {\"collected_data\":{\"merchant_id\":\"M1\"},\"missing_fields\":[\"date_range\"],\"is_complete\":false}\n",
        "data: {\"error\":\"boom\"}\n",
        "data: {\"chunk\":\"tail\"}"
    );

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line(""), StreamLine::Empty);
        assert_eq!(classify_line("  \r"), StreamLine::Empty);
        assert_eq!(classify_line("event: delta"), StreamLine::Event("delta"));
        assert_eq!(classify_line("data:  {\"a\":1}  \r"), StreamLine::Data("{\"a\":1}"));
        assert_eq!(classify_line(": keepalive"), StreamLine::Other(": keepalive"));
    }

    #[test]
    fn test_decode_full_body() {
        let items = decode_all(BODY.as_bytes());
        let malformed = items
            .iter()
            .filter(|d| matches!(d, Decoded::Malformed(_)))
            .count();
        assert_eq!(malformed, 1);

        let recs = records(items);
        assert_eq!(recs.len(), 6);
        assert_eq!(recs[0], StreamRecord::SessionAssigned { id: "s-1".into() });
        assert_eq!(recs[1].as_chunk(), Some("Bonjour, \u{e9}t\u{e9} "));
        assert_eq!(recs[2].as_chunk(), Some("\u{65e5}\u{672c} \u{1f4c5}"));
        match &recs[3] {
            StreamRecord::Extraction {
                fields,
                missing,
                complete,
                usage,
            } => {
                assert_eq!(fields.get("merchant_id"), Some(&FieldValue::from("M1")));
                assert_eq!(missing, &vec!["date_range".to_string()]);
                assert!(!*complete);
                assert_eq!(*usage, None);
            }
            other => panic!("expected extraction, got {:?}", other),
        }
        assert_eq!(recs[4], StreamRecord::error("boom"));
        assert_eq!(recs[5].as_chunk(), Some("tail"));
    }

    #[test]
    fn test_split_at_every_byte_matches_unsplit() {
        let body = BODY.as_bytes();
        let expected = decode_all(body);

        for split in 0..=body.len() {
            let mut decoder = StreamDecoder::new();
            let mut got = decoder.feed(&body[..split]);
            got.extend(decoder.feed(&body[split..]));
            got.extend(decoder.finish());
            assert_eq!(got, expected, "split at byte {}", split);
        }
    }

    #[test]
    fn test_one_byte_reads_match_unsplit() {
        let body = BODY.as_bytes();
        let expected = decode_all(body);

        let mut decoder = StreamDecoder::new();
        let mut got = Vec::new();
        for byte in body {
            got.extend(decoder.feed(std::slice::from_ref(byte)));
        }
        got.extend(decoder.finish());
        assert_eq!(got, expected);
    }

    #[test]
    fn test_utf8_decoder_holds_partial_sequence() {
        let bytes = "\u{e9}".as_bytes();
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&bytes[..1]), "");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(&bytes[1..]), "\u{e9}");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_utf8_decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{fffd}b");
        assert_eq!(decoder.decode(b"\xe6\x97"), "");
        assert_eq!(decoder.finish(), "\u{fffd}");
    }

    #[test]
    fn test_multiple_fields_on_one_payload() {
        let recs = records(decode_payload(
            r#"{"session_id":"s","chunk":"done","collected_data":{},"is_complete":true,"token_usage":{"input_tokens":1,"output_tokens":2,"total_tokens":3}}"#,
        ));
        assert_eq!(recs.len(), 3);
        assert!(matches!(recs[0], StreamRecord::SessionAssigned { .. }));
        assert_eq!(recs[1].as_chunk(), Some("done"));
        match &recs[2] {
            StreamRecord::Extraction {
                fields,
                complete,
                usage,
                ..
            } => {
                assert!(fields.is_empty());
                assert!(*complete);
                assert_eq!(usage.map(|u| u.total_tokens), Some(3));
            }
            other => panic!("expected extraction, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_chunk_produces_no_record() {
        assert!(records(decode_payload(r#"{"chunk":""}"#)).is_empty());
    }

    #[test]
    fn test_null_collected_data_is_absent() {
        assert!(records(decode_payload(r#"{"collected_data":null}"#)).is_empty());
    }

    #[test]
    fn test_structured_error_uses_message() {
        let recs = records(decode_payload(r#"{"error":{"message":"rate limited","code":429}}"#));
        assert_eq!(recs, vec![StreamRecord::error("rate limited")]);
    }

    #[test]
    fn test_non_object_payload_is_malformed() {
        let items = decode_payload("[DONE]");
        assert!(matches!(&items[0], Decoded::Malformed(d) if d.payload == "[DONE]"));
    }

    fn problems(items: &[Decoded]) -> Vec<&str> {
        items
            .iter()
            .filter_map(|d| match d {
                Decoded::Malformed(diagnostic) => Some(diagnostic.error.as_str()),
                Decoded::Record(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_null_token_count_keeps_chunk_and_extraction() {
        let items = decode_payload(
            r#"{"chunk":"Hello","collected_data":{"merchant_id":"M1"},"token_usage":{"input_tokens":null,"output_tokens":4,"total_tokens":4}}"#,
        );
        assert!(problems(&items).is_empty());

        let recs = records(items);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].as_chunk(), Some("Hello"));
        match &recs[1] {
            StreamRecord::Extraction { fields, usage, .. } => {
                assert_eq!(fields.get("merchant_id"), Some(&FieldValue::from("M1")));
                let usage = usage.expect("usage kept");
                assert_eq!(usage.input_tokens, 0);
                assert_eq!(usage.total_tokens, 4);
            }
            other => panic!("expected extraction, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_session_id_is_stringified() {
        let recs = records(decode_payload(r#"{"chunk":"Hi","session_id":42}"#));
        assert_eq!(
            recs,
            vec![
                StreamRecord::SessionAssigned { id: "42".into() },
                StreamRecord::chunk("Hi"),
            ]
        );
    }

    #[test]
    fn test_non_string_missing_entries_skipped() {
        let items = decode_payload(r#"{"chunk":"Hi","collected_data":{},"missing_fields":["a",null,3]}"#);
        assert!(problems(&items).is_empty());

        let recs = records(items);
        assert_eq!(recs[0].as_chunk(), Some("Hi"));
        match &recs[1] {
            StreamRecord::Extraction { missing, .. } => {
                assert_eq!(missing, &vec!["a".to_string()]);
            }
            other => panic!("expected extraction, got {:?}", other),
        }
    }

    #[test]
    fn test_ill_typed_key_reported_alone() {
        let items = decode_payload(
            r#"{"session_id":"s","chunk":["x"],"collected_data":"oops","is_complete":"yes","error":"late"}"#,
        );
        let errors = problems(&items);
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("chunk:"));
        assert!(errors[1].starts_with("collected_data:"));
        assert!(errors[2].starts_with("is_complete:"));

        // Diagnostics come after the records that survived
        assert!(matches!(items[0], Decoded::Record(StreamRecord::SessionAssigned { .. })));
        assert_eq!(items[1], Decoded::Record(StreamRecord::error("late")));
    }

    #[test]
    fn test_event_lines_are_ignored() {
        assert!(decode_line("event: extraction").is_empty());
        assert!(decode_line("id: 42").is_empty());
    }
}
