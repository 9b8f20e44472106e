use serde_json::Value;
use thiserror::Error;

use crate::api::ThreadId;

const MAX_SUMMARY_CHARS: usize = 500;

/// Failures talking to the orchestration service. Nothing here is retried;
/// callers see the remote outcome as-is.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Failed to reach orchestration service: {0}")]
    Connect(String),

    #[error("Orchestration service rejected the credential ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Thread not found: {0}")]
    ThreadNotFound(ThreadId),

    #[error("Orchestration service returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Unexpected response from orchestration service: {0}")]
    Decode(String),

    #[error("Run failed: {0}")]
    Run(String),
}

impl RelayError {
    /// Classify a non-success response. `thread_id` is set for calls scoped
    /// to a thread, where a 404 means the thread does not exist.
    pub fn from_status(status: u16, body: &str, thread_id: Option<&ThreadId>) -> Self {
        let message = summarize_error_body(body);
        match (status, thread_id) {
            (401 | 403, _) => RelayError::Unauthorized { status, message },
            (404, Some(thread_id)) => RelayError::ThreadNotFound(thread_id.clone()),
            _ => RelayError::Upstream { status, message },
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RelayError::Decode(err.to_string())
        } else {
            RelayError::Connect(err.to_string())
        }
    }
}

pub(crate) fn extract_error_summary(value: &Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                Value::String(s) => Some(s.to_string()),
                Value::Object(map) => map
                    .get("message")
                    .and_then(|message| message.as_str().map(str::to_owned)),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("detail")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

/// One-line description of an error payload from an `error` stream event.
pub(crate) fn summarize_error_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "unknown error".to_string(),
        other => match (
            other.get("error").and_then(Value::as_str),
            other.get("message").and_then(Value::as_str),
        ) {
            // `{"error": "<exception name>", "message": "..."}`
            (Some(kind), Some(message)) => format!("{kind}: {message}"),
            _ => extract_error_summary(other)
                .filter(|summary| !summary.is_empty())
                .unwrap_or_else(|| other.to_string()),
        },
    }
}

/// One-line description of an error response body.
pub fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            if !summary.is_empty() {
                return summary;
            }
        }
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_SUMMARY_CHARS {
        let cut: String = collapsed.chars().take(MAX_SUMMARY_CHARS).collect();
        format!("{cut}…")
    } else {
        collapsed
    }
}
