//! Conversation message types
//!
//! A conversation is an ordered, append-only sequence of messages. The only
//! way to remove anything is a full reset back to the seed greeting.

use crate::chat::{ChatError, ChatResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

/// A single chat message. Identity is its position in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    pub fn user(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            timestamp: at,
            provider: None,
            model: None,
            is_error: false,
        }
    }

    pub fn assistant(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
            timestamp: at,
            provider: None,
            model: None,
            is_error: false,
        }
    }

    pub fn from_response(response: ChatResponse, at: DateTime<Utc>) -> Self {
        Self {
            provider: response.provider,
            model: response.model,
            ..Self::assistant(response.response, at)
        }
    }

    pub fn from_error(error: &ChatError, at: DateTime<Utc>) -> Self {
        Self {
            is_error: true,
            ..Self::assistant(error.message.clone(), at)
        }
    }
}

/// Ordered message history for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation holding only `seed`
    pub fn new(seed: Message) -> Self {
        Self {
            messages: vec![seed],
        }
    }

    /// Append a message, returning its index
    pub fn push(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    /// Discard all history and keep only `seed`
    pub fn reset(&mut self, seed: Message) {
        self.messages.clear();
        self.messages.push(seed);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[allow(dead_code)] // State query utility
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}
