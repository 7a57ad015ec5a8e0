//! Chat transport error types

use std::time::Duration;
use thiserror::Error;

/// Shown when neither the server nor the transport gave anything better
pub const DEFAULT_FAILURE_DETAIL: &str =
    "Failed to get response. Please check if the backend server is running.";

/// Chat error with classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        let after = if after.subsec_millis() == 0 && after.as_secs() > 0 {
            format!("{} seconds", after.as_secs())
        } else {
            format!("{} ms", after.as_millis())
        };
        Self::new(
            ChatErrorKind::Timeout,
            format!("Request timed out after {after}"),
        )
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Network, message)
    }

    pub fn empty_input() -> Self {
        Self::new(ChatErrorKind::EmptyInput, "Message is empty")
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    /// The request exceeded the fixed timeout
    Timeout,
    /// Connection refused, DNS failure, non-2xx status or unreadable body
    Network,
    /// Rejected before dispatch; never reaches the transport
    EmptyInput,
}

impl ChatErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::EmptyInput => "empty_input",
        }
    }
}

/// Pick the human-readable detail for a failed call.
///
/// Priority: the server's `detail` field, the server's `message` field, the
/// generic transport message, then [`DEFAULT_FAILURE_DETAIL`].
pub fn failure_detail(body: Option<&str>, transport_message: Option<&str>) -> String {
    let from_body = body
        .and_then(|b| serde_json::from_str::<serde_json::Value>(b).ok())
        .and_then(|parsed| {
            ["detail", "message"].iter().find_map(|field| {
                parsed
                    .get(field)
                    .and_then(serde_json::Value::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .map(str::to_string)
            })
        });

    from_body
        .or_else(|| {
            transport_message
                .filter(|m| !m.trim().is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_FAILURE_DETAIL.to_string())
}
