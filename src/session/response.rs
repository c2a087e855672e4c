//! Tagged success/error responses for the surfaced operations.

use crate::core::error::{ErrorKind, SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// `{"status": "success", ...}` or `{"status": "error", "kind": .., ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApiResponse {
    Success {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<JsonValue>,
    },
    Error {
        kind: ErrorKind,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },
}

impl ApiResponse {
    /// Success with a message only.
    pub fn success(message: impl Into<String>) -> Self {
        ApiResponse::Success {
            message: message.into(),
            data: None,
        }
    }

    /// Success carrying a serialisable payload.
    pub fn with_data<T: Serialize>(message: impl Into<String>, data: &T) -> Self {
        ApiResponse::Success {
            message: message.into(),
            data: serde_json::to_value(data).ok(),
        }
    }

    /// Error response for a session error.
    pub fn error(error: &SessionError) -> Self {
        ApiResponse::Error {
            kind: error.kind(),
            message: error.to_string(),
            hint: error.suggested_fix().map(str::to_string),
        }
    }

    /// Map a result, using `message` for the success case.
    pub fn from_result<T: Serialize>(result: SessionResult<T>, message: impl Into<String>) -> Self {
        match result {
            Ok(data) => Self::with_data(message, &data),
            Err(e) => Self::error(&e),
        }
    }

    /// Whether this is a success response.
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success { .. })
    }

    /// Error kind, if this is an error response.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ApiResponse::Error { kind, .. } => Some(*kind),
            ApiResponse::Success { .. } => None,
        }
    }

    /// Single-line JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"status":"error","kind":"persist_failure","message":"{}"}}"#, e)
        })
    }
}

impl From<SessionError> for ApiResponse {
    fn from(error: SessionError) -> Self {
        Self::error(&error)
    }
}
