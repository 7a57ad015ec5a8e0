//! Events that can occur in a conversation

use crate::chat::{ChatError, ChatResponse};
use chrono::{DateTime, Utc};

/// Events that trigger state transitions
///
/// Timestamps and request ids are minted by whoever creates the event so
/// that the transition function stays pure.
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage {
        text: String,
        request_id: String,
        at: DateTime<Utc>,
    },
    Clear {
        at: DateTime<Utc>,
    },

    // Transport events
    ChatReplied {
        request_id: String,
        response: ChatResponse,
        at: DateTime<Utc>,
    },
    ChatFailed {
        request_id: String,
        error: ChatError,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn user_message(text: impl Into<String>) -> Self {
        Event::UserMessage {
            text: text.into(),
            request_id: uuid::Uuid::new_v4().to_string(),
            at: Utc::now(),
        }
    }

    pub fn clear() -> Self {
        Event::Clear { at: Utc::now() }
    }

    /// Wrap a transport result for the request it answers
    pub fn from_result(request_id: String, result: Result<ChatResponse, ChatError>) -> Self {
        let at = Utc::now();
        match result {
            Ok(response) => Event::ChatReplied {
                request_id,
                response,
                at,
            },
            Err(error) => Event::ChatFailed {
                request_id,
                error,
                at,
            },
        }
    }
}
