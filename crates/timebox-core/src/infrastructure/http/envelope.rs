//! Response envelope unwrapping
//!
//! The backend wraps most payloads as `{ success|status, message, data }`.
//! Some endpoints return the bare payload. Both shapes are accepted.

use serde_json::Value;

use crate::error::{Error, Result};

/// `data` or `message` alone is not enough: records may carry either field
fn is_envelope(map: &serde_json::Map<String, Value>) -> bool {
    (map.contains_key("success") || map.contains_key("status"))
        && (map.contains_key("data") || map.contains_key("message"))
}

fn reports_failure(map: &serde_json::Map<String, Value>) -> bool {
    if map.get("success").and_then(Value::as_bool) == Some(false) {
        return true;
    }
    matches!(
        map.get("status").and_then(Value::as_str),
        Some("error" | "fail" | "failed")
    )
}

/// Extract a human-readable message from an error body
pub fn error_message(body: &Value) -> Option<String> {
    let map = body.as_object()?;
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Return the payload of a successful response
///
/// An envelope that reports failure becomes [`Error::Api`] with `http_status`.
/// An envelope without `data` yields `Value::Null`.
pub fn unwrap_envelope(body: Value, http_status: u16) -> Result<Value> {
    let Value::Object(mut map) = body else {
        return Ok(body);
    };
    if !is_envelope(&map) {
        return Ok(Value::Object(map));
    }
    if reports_failure(&map) {
        let message = error_message(&Value::Object(map.clone()))
            .unwrap_or_else(|| "Request failed".to_string());
        return Err(Error::api(http_status, message));
    }
    Ok(map.remove("data").unwrap_or(Value::Null))
}
