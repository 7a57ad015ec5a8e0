//! Pure state transition function

use super::{ConvContext, ConvState, Effect, Event, LateReplyPolicy};
use crate::conversation::Message;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A reply is still pending, wait for it before sending another message")]
    Busy,
    #[error("Message is empty")]
    EmptyInput,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs; all I/O is
/// described by the returned effects.
pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Empty input is rejected regardless of state, before the busy check
        (_, Event::UserMessage { text, .. }) if text.trim().is_empty() => {
            Err(TransitionError::EmptyInput)
        }

        // Idle + UserMessage -> Sending
        (
            ConvState::Idle,
            Event::UserMessage {
                text,
                request_id,
                at,
            },
        ) => {
            let text = text.trim().to_string();
            Ok(TransitionResult::new(ConvState::Sending {
                request_id: request_id.clone(),
                history_reset: false,
            })
            // Busy is published before the user message appears
            .with_effect(Effect::PublishState)
            .with_effect(Effect::append(Message::user(text.clone(), at)))
            .with_effect(Effect::ClearInput)
            .with_effect(Effect::send_chat(request_id, text)))
        }

        (ConvState::Sending { .. }, Event::UserMessage { .. }) => Err(TransitionError::Busy),

        // Clear never touches the in-flight request, only marks it as late
        (ConvState::Idle, Event::Clear { at }) => Ok(TransitionResult::new(ConvState::Idle)
            .with_effect(Effect::ResetHistory {
                seed: greeting(context, at),
            })),

        (ConvState::Sending { request_id, .. }, Event::Clear { at }) => {
            Ok(TransitionResult::new(ConvState::Sending {
                request_id: request_id.clone(),
                history_reset: true,
            })
            .with_effect(Effect::ResetHistory {
                seed: greeting(context, at),
            }))
        }

        (
            ConvState::Sending {
                request_id,
                history_reset,
            },
            Event::ChatReplied {
                request_id: replied,
                response,
                at,
            },
        ) if *request_id == replied => Ok(settle(
            context,
            replied,
            *history_reset,
            Message::from_response(response, at),
        )),

        (
            ConvState::Sending {
                request_id,
                history_reset,
            },
            Event::ChatFailed {
                request_id: failed,
                error,
                at,
            },
        ) if *request_id == failed => Ok(settle(
            context,
            failed,
            *history_reset,
            Message::from_error(&error, at),
        )),

        (
            _,
            Event::ChatReplied { request_id, .. } | Event::ChatFailed { request_id, .. },
        ) => Err(TransitionError::InvalidTransition(format!(
            "no request {request_id} in flight (state: {})",
            state.name()
        ))),
    }
}

/// Sending -> Idle, appending the reply unless it is late and dropped
fn settle(
    context: &ConvContext,
    request_id: String,
    history_reset: bool,
    reply: Message,
) -> TransitionResult {
    let result = TransitionResult::new(ConvState::Idle);
    let result = if history_reset && context.late_replies == LateReplyPolicy::Drop {
        result.with_effect(Effect::DropReply { request_id })
    } else {
        result.with_effect(Effect::append(reply))
    };
    result.with_effect(Effect::PublishState)
}

fn greeting(context: &ConvContext, at: chrono::DateTime<chrono::Utc>) -> Message {
    Message::assistant(context.greeting.clone(), at)
}
