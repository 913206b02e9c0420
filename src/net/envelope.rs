//! Backend envelope detection and the normalized result contract.
//!
//! DESIGN
//! ======
//! The backend answers in one of three shapes: `{success, data, message}`,
//! `{code, data, message}` with `"0000"` meaning success, or a bare payload.
//! Detection goes by which keys are present (`success`, then `code`), never
//! by whether every field has the expected type. Callers only ever see
//! `NormalizedResponse`.

#[cfg(test)]
#[path = "envelope_test.rs"]
mod envelope_test;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Application code the backend uses for success.
pub const SUCCESS_CODE: &str = "0000";

const DEFAULT_SUCCESS_MESSAGE: &str = "success";
const DEFAULT_FAILURE_MESSAGE: &str = "Request failed";

/// The single result shape every gateway call resolves to.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizedResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub message: String,
    pub code: Option<String>,
}

impl NormalizedResponse {
    pub fn ok(data: Option<Value>) -> Self {
        Self { success: true, data, message: DEFAULT_SUCCESS_MESSAGE.to_owned(), code: None }
    }

    pub fn failure(message: impl Into<String>, code: Option<String>) -> Self {
        Self { success: false, data: None, message: message.into(), code }
    }

    /// Deserialize `data` into `T` without consuming the response.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.data.clone().and_then(|v| serde_json::from_value(v).ok())
    }

    /// Convert into typed data, using `message` as the error on failure.
    ///
    /// # Errors
    ///
    /// Returns the response message if the call failed, or a description of
    /// the mismatch if `data` does not fit `T`.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, String> {
        if !self.success {
            return Err(self.message);
        }
        serde_json::from_value(self.data.unwrap_or(Value::Null)).map_err(|e| format!("unexpected response: {e}"))
    }

    /// Discard `data` and keep only the outcome.
    ///
    /// # Errors
    ///
    /// Returns the response message if the call failed.
    pub fn into_unit(self) -> Result<(), String> {
        if self.success { Ok(()) } else { Err(self.message) }
    }
}

/// Normalize an already-parsed 2xx payload.
///
/// The shape is chosen by key presence: an object with `success` is a
/// flagged envelope, one with `code` is a coded envelope, and anything
/// else is a bare payload. Field types are read leniently, so a malformed
/// envelope still reports failure instead of passing as bare data.
pub fn normalize_value(value: Value) -> NormalizedResponse {
    let Value::Object(map) = value else {
        return NormalizedResponse::ok(Some(value));
    };
    let data = map.get("data").filter(|v| !v.is_null()).cloned();
    let message = map.get("message").map(message_text).unwrap_or_default();
    let code = map.get("code").and_then(code_text);

    if let Some(flag) = map.get("success") {
        return NormalizedResponse { success: flag.as_bool().unwrap_or(false), data, message, code };
    }
    if map.contains_key("code") {
        let success = code.as_deref() == Some(SUCCESS_CODE);
        return NormalizedResponse { success, data, message, code };
    }
    NormalizedResponse::ok(Some(Value::Object(map)))
}

/// Normalize a raw 2xx body. Empty bodies are a data-less success and
/// non-JSON text becomes a string payload.
pub fn normalize_body(body: &str) -> NormalizedResponse {
    if body.trim().is_empty() {
        return NormalizedResponse::ok(None);
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value) => normalize_value(value),
        Err(_) => NormalizedResponse::ok(Some(Value::String(body.to_owned()))),
    }
}

/// Failure message for a 2xx envelope that reported failure.
pub(crate) fn failure_message(message: &str) -> String {
    if message.trim().is_empty() { DEFAULT_FAILURE_MESSAGE.to_owned() } else { message.to_owned() }
}

/// Pull `message` and `code` out of an error body, whatever its shape.
pub(crate) fn error_details(body: &str) -> (Option<String>, Option<String>) {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return (None, None);
    };
    let message = map
        .get("message")
        .or_else(|| map.get("error"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_owned);
    let code = map.get("code").and_then(code_text);
    (message, code)
}

fn message_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn code_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
