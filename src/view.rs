//! Front-end view state and message rendering
//!
//! `ChatView` is the UI's copy of a conversation. It is only ever changed by
//! `apply` (runtime events) and the input-edit methods, never reached into
//! from elsewhere.

use crate::conversation::{Message, Sender};
use crate::runtime::ChatEvent;
use chrono::{Local, TimeZone};
use std::fmt::Display;

/// UI-side mirror of one conversation
#[derive(Debug, Clone, Default)]
pub struct ChatView {
    pub messages: Vec<Message>,
    /// Disables input and send while a reply is pending
    pub busy: bool,
    /// Draft the user is typing
    pub input: String,
    /// Last rejection reason, shown until the next accepted message
    pub notice: Option<String>,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &ChatEvent) {
        match event {
            ChatEvent::Init { messages, busy } => {
                self.messages.clone_from(messages);
                self.busy = *busy;
            }
            ChatEvent::Message { index, message } => {
                // Indices are positions; a gap means we missed events
                if *index != self.messages.len() {
                    tracing::warn!(
                        index = index,
                        have = self.messages.len(),
                        "View out of sync with conversation"
                    );
                }
                self.messages.push(message.clone());
                if message.sender == Sender::User {
                    self.notice = None;
                }
            }
            ChatEvent::HistoryReset { messages } => {
                self.messages.clone_from(messages);
            }
            ChatEvent::StateChange { busy } => self.busy = *busy,
            ChatEvent::InputCleared => self.input.clear(),
            ChatEvent::Rejected { reason } => self.notice = Some(reason.clone()),
            ChatEvent::ReplyDropped { .. } => {}
        }
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Whether the send affordance is enabled
    pub fn can_send(&self) -> bool {
        !self.busy && !self.input.trim().is_empty()
    }
}

/// Render a message with timestamps in local time
pub fn render_message(message: &Message) -> String {
    render_message_in(message, &Local)
}

pub fn render_message_in<Tz>(message: &Message, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let time = message.timestamp.with_timezone(tz).format("%H:%M:%S");
    let who = match message.sender {
        Sender::User => "you",
        Sender::Assistant => "assistant",
    };

    let mut out = if message.is_error {
        format!(
            "[{time}] {who}: Sorry, I encountered an error: {}. Please make sure the backend server is running.",
            message.text.trim_end_matches('.')
        )
    } else {
        format!("[{time}] {who}: {}", message.text)
    };

    if let Some(provider) = &message.provider {
        match &message.model {
            Some(model) => out.push_str(&format!("\n    Powered by {provider} ({model})")),
            None => out.push_str(&format!("\n    Powered by {provider}")),
        }
    }
    out
}
