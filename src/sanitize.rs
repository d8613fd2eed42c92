//! Diagnostics-only redaction of responses and headers.
//!
//! These transforms feed log output exclusively; functional data returned to
//! callers never passes through them. Both produce new owned values and
//! leave the input untouched.

use std::collections::HashMap;

use reqwest::header::{HeaderMap, AUTHORIZATION};
use serde_json::Value;

use crate::types::CubeResponse;

const REDACTED: &str = "[REDACTED]";

/// Top-level keys whose values are always redacted.
const SENSITIVE_FIELDS: [&str; 5] = ["token", "secret", "key", "password", "auth"];

/// Strings longer than this are truncated...
const TRUNCATE_THRESHOLD: usize = 500;
/// ...to this many leading characters plus a length-noting suffix.
const TRUNCATE_KEEP: usize = 200;

/// Produces a redacted, size-bounded copy of a response for logging.
///
/// Row data is collapsed to a placeholder carrying only the row count,
/// sensitive top-level keys are masked, and any remaining oversized string
/// value is truncated.
pub fn sanitize_response(response: &CubeResponse) -> Value {
    let mut value = match serde_json::to_value(response) {
        Ok(value) => value,
        Err(_) => return Value::Null,
    };
    let Value::Object(fields) = &mut value else {
        return value;
    };

    if let Some(rows) = response.data.as_ref().filter(|rows| !rows.is_empty()) {
        fields.insert(
            "data".to_string(),
            Value::String(format!("[DATA REDACTED - {} rows]", rows.len())),
        );
    }

    for field in SENSITIVE_FIELDS {
        if let Some(slot) = fields.get_mut(field) {
            *slot = Value::String(REDACTED.to_string());
        }
    }

    for slot in fields.values_mut() {
        if let Value::String(text) = slot {
            let length = text.chars().count();
            if length > TRUNCATE_THRESHOLD {
                let prefix: String = text.chars().take(TRUNCATE_KEEP).collect();
                *slot = Value::String(format!(
                    "{prefix}... [TRUNCATED - original length: {length}]"
                ));
            }
        }
    }

    value
}

/// Copies a header map with only the `Authorization` entry redacted.
pub fn sanitize_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let rendered = if name == &AUTHORIZATION {
                REDACTED.to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            (name.as_str().to_string(), rendered)
        })
        .collect()
}
