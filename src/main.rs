//! folio-chat - terminal client for the portfolio chat assistant
//!
//! Forwards each question to the chat backend and renders the reply into
//! an in-memory conversation.

mod chat;
mod conversation;
mod runtime;
mod state_machine;
mod view;

use chat::{ChatConfig, HttpChatTransport, LogFormat, LoggingTransport};
use runtime::{ChatEvent, SubmitError};
use state_machine::ConvContext;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use view::{render_message, ChatView};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "folio_chat=info".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ChatConfig::from_env();
    init_tracing(config.log_format);

    tracing::info!(
        api_url = %config.api_url,
        late_replies = ?config.late_replies,
        "Configuration loaded"
    );

    let transport = LoggingTransport::new(HttpChatTransport::new(&config.api_url)?);
    let context = ConvContext::new(uuid::Uuid::new_v4().to_string(), config.greeting)
        .with_late_replies(config.late_replies);
    let (handle, mut events) = runtime::spawn(context, transport);

    println!("Type a question and press Enter. /clear resets the chat, /quit exits.");

    let mut view = ChatView::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "/quit" => break,
                    "/clear" => handle.clear().await?,
                    _ => {
                        view.set_input(line.as_str());
                        if view.busy {
                            println!("  (still waiting for the previous reply)");
                            continue;
                        }
                        if !view.can_send() {
                            continue;
                        }
                        match handle.send_message(&view.input).await {
                            Ok(()) => {}
                            Err(SubmitError::Rejected(e)) => println!("  ({e})"),
                            Err(e @ SubmitError::Closed) => return Err(e.into()),
                        }
                    }
                }
            }

            event = events.recv() => match event {
                Ok(event) => {
                    view.apply(&event);
                    print_event(&event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "Renderer fell behind");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    tracing::info!(conv_id = %handle.conversation_id(), "Exiting");
    handle.shutdown();
    Ok(())
}

fn print_event(event: &ChatEvent) {
    match event {
        ChatEvent::Init { messages, .. } => {
            for message in messages {
                println!("{}", render_message(message));
            }
        }
        ChatEvent::Message { message, .. } => println!("{}", render_message(message)),
        ChatEvent::HistoryReset { messages } => {
            println!("-- chat cleared --");
            for message in messages {
                println!("{}", render_message(message));
            }
        }
        ChatEvent::StateChange { busy: true } => println!("  assistant is thinking..."),
        ChatEvent::Rejected { reason } => println!("  ({reason})"),
        ChatEvent::StateChange { busy: false }
        | ChatEvent::InputCleared
        | ChatEvent::ReplyDropped { .. } => {}
    }
}
