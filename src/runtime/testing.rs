//! Mock implementations for testing
//!
//! These mocks enable integration testing of the runtime without real I/O.

use super::{spawn, ChatEvent, ConversationHandle};
use crate::chat::{ChatError, ChatResponse, ChatTransport};
use crate::conversation::Message;
use crate::state_machine::{ConvContext, LateReplyPolicy};
use crate::view::ChatView;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

// ============================================================================
// Mock Transport
// ============================================================================

/// Mock transport that returns queued replies
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<ChatResponse, ChatError>>>,
    /// Record of all messages sent
    pub requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_response(&self, response: ChatResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error reply
    pub fn queue_error(&self, error: ChatError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded messages
    pub fn recorded_requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, message: &str) -> Result<ChatResponse, ChatError> {
        self.requests.lock().unwrap().push(message.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::network("No mock response queued")))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send(&self, message: &str) -> Result<ChatResponse, ChatError> {
        self.next(message)
    }

    fn endpoint(&self) -> &str {
        "mock://chat"
    }
}

// ============================================================================
// Delayed Mock Transport (for busy / clear / shutdown testing)
// ============================================================================

/// Mock transport with a configurable delay before replying
pub struct DelayedMockTransport {
    inner: MockTransport,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockTransport {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockTransport::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_response(&self, response: ChatResponse) {
        self.inner.queue_response(response);
    }

    pub fn recorded_requests(&self) -> Vec<String> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl ChatTransport for DelayedMockTransport {
    async fn send(&self, message: &str) -> Result<ChatResponse, ChatError> {
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.next(message)
    }

    fn endpoint(&self) -> &str {
        "mock://delayed"
    }
}

// ============================================================================
// Test Runtime
// ============================================================================

pub const TEST_GREETING: &str = "Hi, ask me anything";

/// A running conversation plus a view kept in sync from its events
pub struct TestRuntime<T: ChatTransport + 'static> {
    pub handle: ConversationHandle,
    pub events: broadcast::Receiver<ChatEvent>,
    pub view: ChatView,
    pub transport: Arc<T>,
}

impl<T: ChatTransport + 'static> TestRuntime<T> {
    pub fn start(transport: T) -> Self {
        Self::start_with_policy(transport, LateReplyPolicy::Drop)
    }

    pub fn start_with_policy(transport: T, policy: LateReplyPolicy) -> Self {
        let transport = Arc::new(transport);
        let context = ConvContext::new("test-conv", TEST_GREETING).with_late_replies(policy);
        let (handle, events) = spawn(context, transport.clone());
        Self {
            handle,
            events,
            view: ChatView::new(),
            transport,
        }
    }

    /// Send user message to the runtime
    pub async fn send_message(&self, text: &str) {
        self.handle
            .send_message(text)
            .await
            .expect("Failed to send message");
    }

    pub async fn clear(&self) {
        self.handle.clear().await.expect("Failed to clear");
    }

    /// Feed events into the view until `done` holds or the timeout passes
    pub async fn wait_for(&mut self, timeout: Duration, done: impl Fn(&ChatView) -> bool) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if done(&self.view) {
                return true;
            }
            match tokio::time::timeout(Duration::from_millis(50), self.events.recv()).await {
                Ok(Ok(event)) => self.view.apply(&event),
                Ok(Err(broadcast::error::RecvError::Closed)) => return done(&self.view),
                _ => continue,
            }
        }
        done(&self.view)
    }

    /// Wait until `count` messages are shown and no reply is pending
    pub async fn wait_for_settled(&mut self, count: usize) -> bool {
        self.wait_for(Duration::from_secs(2), |v| !v.busy && v.messages.len() == count)
            .await
    }

    /// Drain whatever events are already queued
    pub async fn drain(&mut self) {
        while let Ok(Ok(event)) =
            tokio::time::timeout(Duration::from_millis(50), self.events.recv()).await
        {
            self.view.apply(&event);
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.view.messages
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatErrorKind, HttpChatTransport};
    use crate::conversation::Sender;
    use crate::runtime::SubmitError;

    #[tokio::test]
    async fn test_mock_transport() {
        let mock = MockTransport::new();
        mock.queue_response(ChatResponse::text("Hello"));

        let response = mock.send("hi").await.unwrap();
        assert_eq!(response.response, "Hello");

        // Second call should fail (no more responses)
        assert!(mock.send("again").await.is_err());
        assert_eq!(mock.recorded_requests(), vec!["hi", "again"]);
    }

    #[tokio::test]
    async fn test_init_shows_greeting() {
        let mut rt = TestRuntime::start(MockTransport::new());
        assert!(rt.wait_for_settled(1).await);
        assert_eq!(rt.messages()[0].text, TEST_GREETING);
        assert_eq!(rt.messages()[0].sender, Sender::Assistant);
    }

    /// Scenario A: a question and its answer
    #[tokio::test]
    async fn test_question_and_answer() {
        let mock = MockTransport::new();
        mock.queue_response(ChatResponse::text("Python, TS, ...").with_model("groq", "llama"));

        let mut rt = TestRuntime::start(mock);
        rt.view.set_input("What are your skills?");
        rt.send_message("What are your skills?").await;

        assert!(rt.wait_for_settled(3).await);
        let msgs = rt.messages();
        assert_eq!(msgs[1].sender, Sender::User);
        assert_eq!(msgs[1].text, "What are your skills?");
        assert_eq!(msgs[2].sender, Sender::Assistant);
        assert_eq!(msgs[2].text, "Python, TS, ...");
        assert_eq!(msgs[2].provider.as_deref(), Some("groq"));
        assert!(!msgs[2].is_error);
        assert!(rt.view.input.is_empty());
        assert_eq!(rt.transport.recorded_requests(), vec!["What are your skills?"]);
    }

    #[tokio::test]
    async fn test_user_text_is_trimmed() {
        let mock = MockTransport::new();
        mock.queue_response(ChatResponse::text("ok"));

        let mut rt = TestRuntime::start(mock);
        rt.send_message("  Hello there \n").await;

        assert!(rt.wait_for_settled(3).await);
        assert_eq!(rt.messages()[1].text, "Hello there");
        assert_eq!(rt.transport.recorded_requests(), vec!["Hello there"]);
    }

    #[tokio::test]
    async fn test_busy_until_reply() {
        let mock = DelayedMockTransport::new(Duration::from_millis(300));
        mock.queue_response(ChatResponse::text("done"));

        let mut rt = TestRuntime::start(mock);
        rt.send_message("Hello").await;

        assert!(rt.wait_for(Duration::from_secs(1), |v| v.busy).await);
        assert_eq!(rt.messages().len(), 2);

        assert!(rt.wait_for_settled(3).await);
    }

    /// Scenario B: sending while busy changes nothing and calls nothing
    #[tokio::test]
    async fn test_send_while_busy_rejected() {
        let mock = DelayedMockTransport::new(Duration::from_millis(300));
        mock.queue_response(ChatResponse::text("first reply"));
        let started = mock.request_started.clone();

        let mut rt = TestRuntime::start(mock);
        rt.send_message("What are your skills?").await;
        started.notified().await;

        rt.send_message("Hello").await;
        assert!(rt.wait_for(Duration::from_secs(1), |v| v.notice.is_some()).await);
        assert_eq!(rt.messages().len(), 2);

        assert!(rt.wait_for_settled(3).await);
        assert_eq!(rt.messages()[2].text, "first reply");
        assert_eq!(rt.transport.recorded_requests(), vec!["What are your skills?"]);
    }

    #[tokio::test]
    async fn test_blank_input_rejected_before_dispatch() {
        let mut rt = TestRuntime::start(MockTransport::new());
        let err = rt.handle.send_message("   \t ").await.unwrap_err();
        match err {
            SubmitError::Rejected(e) => assert_eq!(e.kind, ChatErrorKind::EmptyInput),
            SubmitError::Closed => panic!("runtime should be running"),
        }

        rt.drain().await;
        assert_eq!(rt.messages().len(), 1);
        assert!(!rt.view.busy);
        assert!(rt.transport.recorded_requests().is_empty());
    }

    /// Scenario C: a timeout becomes an error message
    #[tokio::test]
    async fn test_timeout_becomes_error_message() {
        let mock = MockTransport::new();
        mock.queue_error(ChatError::timeout(Duration::from_secs(30)));

        let mut rt = TestRuntime::start(mock);
        rt.send_message("Hello").await;

        assert!(rt.wait_for_settled(3).await);
        let reply = &rt.messages()[2];
        assert!(reply.is_error);
        assert!(reply.text.contains("timed out"));
    }

    /// Scenario D: the server's detail becomes the message text
    #[tokio::test]
    async fn test_server_detail_becomes_error_message() {
        use axum::http::StatusCode;
        use axum::routing::post;
        use axum::{Json, Router};

        let router = Router::new().route(
            "/chat",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "detail": "model unavailable" })),
                )
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let transport = HttpChatTransport::new(&format!("http://{addr}")).unwrap();
        let mut rt = TestRuntime::start(transport);
        rt.send_message("Hello").await;

        assert!(rt.wait_for_settled(3).await);
        let reply = &rt.messages()[2];
        assert!(reply.is_error);
        assert_eq!(reply.text, "model unavailable");
    }

    #[tokio::test]
    async fn test_clear_resets_history() {
        let mock = MockTransport::new();
        mock.queue_response(ChatResponse::text("one"));
        mock.queue_response(ChatResponse::text("two"));

        let mut rt = TestRuntime::start(mock);
        rt.send_message("first").await;
        assert!(rt.wait_for_settled(3).await);
        rt.send_message("second").await;
        assert!(rt.wait_for_settled(5).await);

        rt.clear().await;
        assert!(rt.wait_for_settled(1).await);
        assert_eq!(rt.messages()[0].text, TEST_GREETING);
    }

    #[tokio::test]
    async fn test_reply_after_clear_is_dropped() {
        let mock = DelayedMockTransport::new(Duration::from_millis(300));
        mock.queue_response(ChatResponse::text("late"));
        let started = mock.request_started.clone();

        let mut rt = TestRuntime::start(mock);
        rt.send_message("Hello").await;
        started.notified().await;
        rt.clear().await;

        // Clear is not gated by busy and leaves the request running
        assert!(rt.wait_for(Duration::from_secs(1), |v| v.busy && v.messages.len() == 1).await);

        assert!(rt.wait_for_settled(1).await);
        assert_eq!(rt.messages()[0].text, TEST_GREETING);
        assert_eq!(rt.transport.recorded_requests(), vec!["Hello"]);
    }

    #[tokio::test]
    async fn test_reply_after_clear_appended_when_configured() {
        let mock = DelayedMockTransport::new(Duration::from_millis(300));
        mock.queue_response(ChatResponse::text("late"));
        let started = mock.request_started.clone();

        let mut rt = TestRuntime::start_with_policy(mock, LateReplyPolicy::Append);
        rt.send_message("Hello").await;
        started.notified().await;
        rt.clear().await;

        assert!(rt.wait_for(Duration::from_secs(1), |v| v.busy && v.messages.len() == 1).await);

        assert!(rt.wait_for_settled(2).await);
        assert_eq!(rt.messages()[0].text, TEST_GREETING);
        assert_eq!(rt.messages()[1].text, "late");
    }

    #[tokio::test]
    async fn test_shutdown_abandons_request() {
        let mock = DelayedMockTransport::new(Duration::from_millis(300));
        mock.queue_response(ChatResponse::text("never shown"));
        let started = mock.request_started.clone();

        let mut rt = TestRuntime::start(mock);
        rt.send_message("Hello").await;
        started.notified().await;
        rt.handle.shutdown();

        // Outlast the mock's delay so a late reply would have shown up
        rt.wait_for(Duration::from_millis(600), |_| false).await;
        assert_eq!(rt.messages().len(), 2);
        assert!(rt.transport.recorded_requests().is_empty());
        assert!(rt.handle.is_closed());
        assert!(matches!(
            rt.handle.send_message("anyone there?").await,
            Err(SubmitError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_conversations_are_independent() {
        let a = MockTransport::new();
        a.queue_response(ChatResponse::text("from a"));
        let b = MockTransport::new();
        b.queue_response(ChatResponse::text("from b"));

        let mut rt_a = TestRuntime::start(a);
        let mut rt_b = TestRuntime::start(b);
        rt_a.send_message("to a").await;
        rt_b.send_message("to b").await;

        assert!(rt_a.wait_for_settled(3).await);
        assert!(rt_b.wait_for_settled(3).await);
        assert_eq!(rt_a.messages()[2].text, "from a");
        assert_eq!(rt_b.messages()[2].text, "from b");
    }
}
