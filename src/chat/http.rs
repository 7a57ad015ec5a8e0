//! HTTP implementation of the chat transport

use super::error::failure_detail;
use super::{ChatError, ChatRequest, ChatResponse, ChatTransport};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Fixed per-call timeout. Not configurable by callers.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends `POST {base}/chat` with a JSON body, one attempt per call
pub struct HttpChatTransport {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpChatTransport {
    pub fn new(base_url: &str) -> Result<Self, ChatError> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    pub(crate) fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    async fn post(&self, message: &str) -> Result<ChatResponse, ChatError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest::new(message))
            .send()
            .await
            .map_err(|e| self.request_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.request_error(&e))?;

        if !status.is_success() {
            return Err(ChatError::network(failure_detail(
                Some(&body),
                Some(&format!("HTTP {status}")),
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ChatError::network(failure_detail(
                Some(&body),
                Some(&format!("Failed to parse response: {e}")),
            ))
        })
    }

    fn request_error(&self, e: &reqwest::Error) -> ChatError {
        if e.is_timeout() {
            ChatError::timeout(self.timeout)
        } else if e.is_connect() {
            ChatError::network(failure_detail(None, Some(&format!("Connection failed: {e}"))))
        } else {
            ChatError::network(failure_detail(None, Some(&e.to_string())))
        }
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send(&self, message: &str) -> Result<ChatResponse, ChatError> {
        // Covers connect, send and body read as one budget
        match tokio::time::timeout(self.timeout, self.post(message)).await {
            Ok(result) => result,
            Err(_) => Err(ChatError::timeout(self.timeout)),
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
