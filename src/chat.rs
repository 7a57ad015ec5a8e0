//! Chat transport
//!
//! The request/response boundary to the remote chat backend: one message
//! out, one reply or one classified error back.

mod config;
mod error;
mod http;
mod types;

pub use config::{ChatConfig, LogFormat};
pub use error::{ChatError, ChatErrorKind};
pub use http::HttpChatTransport;
pub use types::{ChatRequest, ChatResponse};

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for chat backends
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a single message. One attempt, no retry.
    async fn send(&self, message: &str) -> Result<ChatResponse, ChatError>;

    /// Where requests go, for logging
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn send(&self, message: &str) -> Result<ChatResponse, ChatError> {
        (**self).send(message).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

/// Logging wrapper for chat transports
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T: ChatTransport> LoggingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: ChatTransport> ChatTransport for LoggingTransport<T> {
    async fn send(&self, message: &str) -> Result<ChatResponse, ChatError> {
        let start = std::time::Instant::now();
        let result = self.inner.send(message).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    endpoint = %self.inner.endpoint(),
                    duration_ms = %duration.as_millis(),
                    provider = response.provider.as_deref().unwrap_or("-"),
                    model = response.model.as_deref().unwrap_or("-"),
                    chars = response.response.chars().count(),
                    "Chat request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.inner.endpoint(),
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Chat request failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}
