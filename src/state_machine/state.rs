//! Conversation state types

use serde::{Deserialize, Serialize};

/// Conversation state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// Ready for user input, no request outstanding
    #[default]
    Idle,

    /// One chat request in flight
    Sending {
        request_id: String,
        /// History was cleared after this request went out
        #[serde(default)]
        history_reset: bool,
    },
}

impl ConvState {
    /// The busy flag: true while a request is outstanding
    pub fn is_busy(&self) -> bool {
        matches!(self, ConvState::Sending { .. })
    }

    #[allow(dead_code)] // State query utility
    pub fn in_flight_request(&self) -> Option<&str> {
        match self {
            ConvState::Sending { request_id, .. } => Some(request_id),
            ConvState::Idle => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConvState::Idle => "idle",
            ConvState::Sending { .. } => "sending",
        }
    }
}

/// What to do with a reply to a request issued before the last clear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LateReplyPolicy {
    /// Discard it; the cleared history stays clean
    #[default]
    Drop,
    /// Append it to the cleared history anyway
    Append,
}

impl LateReplyPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "drop" => Some(Self::Drop),
            "append" => Some(Self::Append),
            _ => None,
        }
    }
}

/// Context for a conversation (immutable configuration)
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub conversation_id: String,
    /// Seed assistant message on start and after every clear
    pub greeting: String,
    pub late_replies: LateReplyPolicy,
}

impl ConvContext {
    pub fn new(conversation_id: impl Into<String>, greeting: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            greeting: greeting.into(),
            late_replies: LateReplyPolicy::default(),
        }
    }

    pub fn with_late_replies(mut self, policy: LateReplyPolicy) -> Self {
        self.late_replies = policy;
        self
    }
}
