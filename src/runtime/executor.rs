//! Conversation runtime executor

use super::ChatEvent;
use crate::chat::{ChatError, ChatTransport};
use crate::conversation::{Conversation, Message};
use crate::state_machine::{transition, ConvContext, ConvState, Effect, Event, TransitionError};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Conversation runtime, generic over the chat transport
pub struct ConversationRuntime<T>
where
    T: ChatTransport + 'static,
{
    context: ConvContext,
    state: ConvState,
    conversation: Conversation,
    transport: Arc<T>,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so that dropping every handle ends the loop
    event_tx: mpsc::WeakSender<Event>,
    broadcast_tx: broadcast::Sender<ChatEvent>,
    /// Token to abandon the in-flight request on shutdown
    request_cancel: Option<CancellationToken>,
    shutdown: CancellationToken,
}

impl<T> ConversationRuntime<T>
where
    T: ChatTransport + 'static,
{
    pub fn new(
        context: ConvContext,
        transport: T,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::WeakSender<Event>,
        broadcast_tx: broadcast::Sender<ChatEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        let conversation = Conversation::new(Message::assistant(context.greeting.clone(), Utc::now()));
        Self {
            context,
            state: ConvState::Idle,
            conversation,
            transport: Arc::new(transport),
            event_rx,
            event_tx,
            broadcast_tx,
            request_cancel: None,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            conv_id = %self.context.conversation_id,
            endpoint = %self.transport.endpoint(),
            "Starting conversation runtime"
        );

        let _ = self.broadcast_tx.send(ChatEvent::Init {
            messages: self.conversation.messages().to_vec(),
            busy: self.state.is_busy(),
        });

        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => break,

                event = self.event_rx.recv() => match event {
                    Some(event) => self.process_event(event),
                    None => break,
                },
            }
        }

        if let Some(token) = self.request_cancel.take() {
            tracing::info!(conv_id = %self.context.conversation_id, "Abandoning in-flight chat request");
            token.cancel();
        }

        tracing::info!(conv_id = %self.context.conversation_id, "Conversation runtime stopped");
    }

    fn process_event(&mut self, event: Event) {
        let result = match transition(&self.state, &self.context, event) {
            Ok(r) => r,
            Err(e) => {
                match &e {
                    TransitionError::InvalidTransition(_) => {
                        tracing::warn!(conv_id = %self.context.conversation_id, error = %e, "Ignoring event");
                    }
                    TransitionError::Busy | TransitionError::EmptyInput => {
                        tracing::debug!(conv_id = %self.context.conversation_id, error = %e, "Rejected event");
                    }
                }
                let _ = self.broadcast_tx.send(ChatEvent::Rejected {
                    reason: e.to_string(),
                });
                return;
            }
        };

        self.state = result.new_state;
        if !self.state.is_busy() {
            self.request_cancel = None;
        }

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendMessage { message } => {
                let index = self.conversation.push(message.clone());
                let _ = self.broadcast_tx.send(ChatEvent::Message { index, message });
            }

            Effect::ResetHistory { seed } => {
                self.conversation.reset(seed);
                tracing::info!(conv_id = %self.context.conversation_id, "History cleared");
                let _ = self.broadcast_tx.send(ChatEvent::HistoryReset {
                    messages: self.conversation.messages().to_vec(),
                });
            }

            Effect::ClearInput => {
                let _ = self.broadcast_tx.send(ChatEvent::InputCleared);
            }

            Effect::PublishState => {
                let _ = self.broadcast_tx.send(ChatEvent::StateChange {
                    busy: self.state.is_busy(),
                });
            }

            Effect::SendChat { request_id, text } => self.spawn_request(request_id, text),

            Effect::DropReply { request_id } => {
                tracing::info!(
                    conv_id = %self.context.conversation_id,
                    request_id = %request_id,
                    "Dropping reply that arrived after clear"
                );
                let _ = self.broadcast_tx.send(ChatEvent::ReplyDropped { request_id });
            }
        }
    }

    /// Run the transport call as a background task, raced against cancellation
    fn spawn_request(&mut self, request_id: String, text: String) {
        let Some(event_tx) = self.event_tx.upgrade() else {
            tracing::warn!(request_id = %request_id, "No handles left, not sending");
            // No reply can arrive without a sender, settle as failed
            let closed = ChatError::network("Conversation closed before the request was sent");
            self.process_event(Event::from_result(request_id, Err(closed)));
            return;
        };

        let cancel_token = CancellationToken::new();
        self.request_cancel = Some(cancel_token.clone());

        let transport = Arc::clone(&self.transport);
        let conv_id = self.context.conversation_id.clone();

        tokio::spawn(async move {
            tracing::debug!(conv_id = %conv_id, request_id = %request_id, "Sending chat request");

            tokio::select! {
                biased;

                () = cancel_token.cancelled() => {
                    tracing::info!(conv_id = %conv_id, request_id = %request_id, "Chat request abandoned");
                }

                result = transport.send(&text) => {
                    let _ = event_tx.send(Event::from_result(request_id, result)).await;
                }
            }
        });
    }
}
