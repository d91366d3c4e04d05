//! Wire types shared by the client and its callers

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Opaque per-user context forwarded with every chat request
pub type UserContext = serde_json::Map<String, serde_json::Value>;

/// Collected fields keyed by field name
pub type CollectedFields = BTreeMap<String, FieldValue>;

/// Body of a `POST /chat/stream` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// The user's text
    pub message: String,
    pub user_id: String,
    pub language: String,
    /// Session assigned by the service on an earlier reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_context: Option<UserContext>,
}

impl OutboundMessage {
    /// Create a message without session or user context
    pub fn new(
        message: impl Into<String>,
        user_id: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            user_id: user_id.into(),
            language: language.into(),
            session_id: None,
            user_context: None,
        }
    }

    /// Attach the current session id
    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    /// Attach the user context loaded at startup
    pub fn with_user_context(mut self, context: Option<UserContext>) -> Self {
        self.user_context = context;
        self
    }
}

/// Token usage reported alongside extraction data.
///
/// Counts that are missing, `null` or not numeric read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default, deserialize_with = "lenient_count")]
    pub input_tokens: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub output_tokens: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_tokens: u64,
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let count = match &value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(count.unwrap_or(0))
}

/// Value of one collected field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Single text value
    Text(String),
    /// Ordered list of text values
    List(Vec<String>),
    /// Anything else the service sends (numbers, flags, null, objects)
    Other(serde_json::Value),
}

impl FieldValue {
    /// Whether the value carries something worth showing.
    ///
    /// Empty text, empty lists, `null`, `false` and zero count as absent.
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Text(text) => !text.is_empty(),
            FieldValue::List(items) => !items.is_empty(),
            FieldValue::Other(value) => match value {
                serde_json::Value::Null => false,
                serde_json::Value::Bool(b) => *b,
                serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
                serde_json::Value::String(s) => !s.is_empty(),
                serde_json::Value::Array(items) => !items.is_empty(),
                serde_json::Value::Object(_) => true,
            },
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(value: Vec<&str>) -> Self {
        FieldValue::List(value.into_iter().map(String::from).collect())
    }
}

/// Classification of the health probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service reported `status: "healthy"`
    Healthy,
    /// Service answered but is not healthy
    Degraded,
    /// Service could not be reached or answered with an error status
    Unreachable,
}

/// Outcome of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthResult {
    pub status: HealthStatus,
    pub provider: Option<String>,
    pub model: Option<String>,
    /// Why the probe was not healthy, when known
    pub detail: Option<String>,
}

impl HealthResult {
    /// An unreachable result with a reason
    pub fn unreachable(detail: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unreachable,
            provider: None,
            model: None,
            detail: Some(detail.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Raw `GET /health` body
#[derive(Debug, Deserialize)]
pub(crate) struct HealthBody {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl From<HealthBody> for HealthResult {
    fn from(body: HealthBody) -> Self {
        let status = match body.status.as_deref() {
            Some("healthy") => HealthStatus::Healthy,
            _ => HealthStatus::Degraded,
        };
        let detail = match status {
            HealthStatus::Healthy => None,
            _ => Some(format!(
                "service status: {}",
                body.status.as_deref().unwrap_or("unknown")
            )),
        };
        Self {
            status,
            provider: body.provider,
            model: body.model,
            detail,
        }
    }
}

/// Body of a `POST /confirm` request
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ConfirmRequest<'a> {
    pub session_id: &'a str,
    pub user_id: &'a str,
}

/// Body of a `POST /confirm` response.
///
/// `success: false` is a business outcome, not a transport error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub schedule_id: Option<serde_json::Value>,
    #[serde(default)]
    pub config_id: Option<serde_json::Value>,
}
