//! Effects produced by state transitions

use crate::conversation::Message;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a message to the conversation
    AppendMessage { message: Message },

    /// Replace the whole history with the seed greeting
    ResetHistory { seed: Message },

    /// Empty the front-end's input buffer
    ClearInput,

    /// Issue the single transport call for this request
    SendChat { request_id: String, text: String },

    /// Tell subscribers the state (busy flag) changed
    PublishState,

    /// A late reply was discarded
    DropReply { request_id: String },
}

impl Effect {
    pub fn append(message: Message) -> Self {
        Effect::AppendMessage { message }
    }

    pub fn send_chat(request_id: impl Into<String>, text: impl Into<String>) -> Self {
        Effect::SendChat {
            request_id: request_id.into(),
            text: text.into(),
        }
    }
}
