//! Runtime for executing conversations
//!
//! Each conversation runs as its own task: events come in over an `mpsc`
//! channel, the pure state machine decides, the executor carries out the
//! effects and broadcasts `ChatEvent`s to whoever renders the session.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::ConversationRuntime;

use crate::chat::{ChatError, ChatTransport};
use crate::conversation::Message;
use crate::state_machine::{ConvContext, Event};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Events sent to UI subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Full history, sent once when the runtime starts
    Init {
        messages: Vec<Message>,
        busy: bool,
    },
    Message {
        index: usize,
        message: Message,
    },
    HistoryReset {
        messages: Vec<Message>,
    },
    StateChange {
        busy: bool,
    },
    InputCleared,
    /// An event was refused (busy, empty input)
    Rejected {
        reason: String,
    },
    ReplyDropped {
        request_id: String,
    },
}

/// Errors from submitting to a conversation
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Rejected(#[from] ChatError),
    #[error("Conversation runtime has stopped")]
    Closed,
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct ConversationHandle {
    conversation_id: String,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<ChatEvent>,
    shutdown: CancellationToken,
}

impl ConversationHandle {
    /// Submit user input. Blank input is refused here, before dispatch.
    pub async fn send_message(&self, text: &str) -> Result<(), SubmitError> {
        if text.trim().is_empty() {
            return Err(ChatError::empty_input().into());
        }
        self.send_event(Event::user_message(text)).await
    }

    /// Reset the history to the greeting. Allowed while busy.
    pub async fn clear(&self) -> Result<(), SubmitError> {
        self.send_event(Event::clear()).await
    }

    async fn send_event(&self, event: Event) -> Result<(), SubmitError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| SubmitError::Closed)
    }

    /// Subscribe to conversation updates
    #[allow(dead_code)] // Extra subscribers beyond the one from spawn()
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Stop the runtime. An in-flight request is abandoned.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn is_closed(&self) -> bool {
        self.event_tx.is_closed()
    }
}

/// Start a conversation runtime in the background.
///
/// The returned receiver is subscribed before the runtime starts, so it
/// always sees the `Init` event.
pub fn spawn<T>(context: ConvContext, transport: T) -> (ConversationHandle, broadcast::Receiver<ChatEvent>)
where
    T: ChatTransport + 'static,
{
    let (event_tx, event_rx) = mpsc::channel(32);
    let (broadcast_tx, broadcast_rx) = broadcast::channel(128);
    let shutdown = CancellationToken::new();

    let handle = ConversationHandle {
        conversation_id: context.conversation_id.clone(),
        event_tx: event_tx.clone(),
        broadcast_tx: broadcast_tx.clone(),
        shutdown: shutdown.clone(),
    };

    let runtime = ConversationRuntime::new(
        context,
        transport,
        event_rx,
        event_tx.downgrade(),
        broadcast_tx,
        shutdown,
    );

    let conv_id = handle.conversation_id.clone();
    tokio::spawn(async move {
        runtime.run().await;
        tracing::debug!(conv_id = %conv_id, "Conversation task finished");
    });

    (handle, broadcast_rx)
}
