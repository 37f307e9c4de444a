//! Flattening of backend replies into one content string.
//!
//! The backend answers with
//! `{"response": [{"text": "...", "type": "TEXT" | "OPTIONS", "options": [{"text": "..."}]}], ...}`.
//! Only the first reply item is used. Shape mismatches degrade to a
//! fallback rendering; only a body that is not JSON at all is an error.

use serde_json::Value;
use thiserror::Error;

/// Used when the first reply item has no `text`.
pub const MISSING_TEXT: &str = "No response text";

/// The backend body could not be read as JSON.
#[derive(Debug, Error)]
#[error("backend reply is not valid JSON: {0}")]
pub struct NormalizeError(#[from] serde_json::Error);

/// Parse a raw backend body and flatten it.
pub fn normalize(body: &str) -> Result<String, NormalizeError> {
    let payload: Value = serde_json::from_str(body)?;
    Ok(normalize_value(&payload))
}

/// Flatten an already parsed backend reply.
pub fn normalize_value(payload: &Value) -> String {
    let Some(item) = first_item(payload) else {
        return payload.to_string();
    };

    let mut content = match item.get("text") {
        Some(Value::String(text)) => text.clone(),
        None | Some(Value::Null) => MISSING_TEXT.to_string(),
        Some(other) => other.to_string(),
    };

    if item.get("type").and_then(Value::as_str) == Some("OPTIONS") {
        if let Some(options) = item.get("options").and_then(Value::as_array) {
            append_options(&mut content, options);
        }
    }

    content
}

/// `response[0]`, when `response` is a non-empty array whose first element is an object.
fn first_item(payload: &Value) -> Option<&serde_json::Map<String, Value>> {
    payload
        .get("response")?
        .as_array()?
        .first()?
        .as_object()
}

fn append_options(content: &mut String, options: &[Value]) {
    if options.is_empty() {
        return;
    }

    content.push_str("\n\nOptions:");
    for (i, option) in options.iter().enumerate() {
        let index = i + 1;
        let line = match option.get("text").and_then(Value::as_str) {
            Some(text) => format!("\n{index}. {text}"),
            None => format!("\n{index}. Option {index}"),
        };
        content.push_str(&line);
    }
}
