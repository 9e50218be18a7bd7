//! # API Response Envelope
//!
//! Every exposed operation answers with `(success, message, payload)`.
//! Failures put the stable error code in `payload.error`.

use crate::errors::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Uniform response returned to outer layers (UI, reporting, policy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    pub payload: Value,
}

impl ApiResponse {
    /// Successful response carrying a serializable payload.
    ///
    /// Falls back to `Value::Null` if the payload cannot be represented as JSON.
    pub fn ok<T: Serialize>(message: impl Into<String>, payload: &T) -> Self {
        Self {
            success: true,
            message: message.into(),
            payload: serde_json::to_value(payload).unwrap_or(Value::Null),
        }
    }

    /// Failed response; the message is the typed error's display string.
    pub fn failure<E>(error: E) -> Self
    where
        E: std::fmt::Display + ErrorCode,
    {
        Self {
            success: false,
            message: error.to_string(),
            payload: json!({ "error": error.code() }),
        }
    }

    /// Error code of a failed response
    pub fn error_code(&self) -> Option<&str> {
        self.payload.get("error").and_then(Value::as_str)
    }

    /// Convert a typed result into the envelope.
    pub fn from_result<T, E>(result: Result<T, E>, message: impl Into<String>) -> Self
    where
        T: Serialize,
        E: std::fmt::Display + ErrorCode,
    {
        match result {
            Ok(payload) => Self::ok(message, &payload),
            Err(e) => Self::failure(e),
        }
    }
}
