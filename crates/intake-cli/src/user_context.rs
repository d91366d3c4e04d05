//! User context loading
//!
//! The user context is an opaque JSON object sent with every message. It is
//! read once at startup; a missing file means anonymous mode.

use intake_api::UserContext;
use std::fs;
use std::path::Path;

/// Load the user context object from `path`.
///
/// Unreadable, malformed, or non-object files are logged and treated as absent.
pub fn load(path: &Path) -> Option<UserContext> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No user context file");
        return None;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read user context");
            return None;
        }
    };

    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(serde_json::Value::Object(map)) => {
            tracing::debug!(keys = map.len(), "Loaded user context");
            Some(map)
        }
        Ok(_) => {
            tracing::warn!(path = %path.display(), "User context is not a JSON object; ignoring");
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Malformed user context; ignoring");
            None
        }
    }
}
