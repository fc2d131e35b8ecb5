//! The streaming chat exchange: one utterance in, one streamed reply out.
//!
//! A `send` appends the user's turn and an empty assistant turn up front,
//! then grows the assistant turn as bytes arrive. Every failure mode ends
//! up as visible content inside that turn; nothing here is fatal to the
//! session and the client is always ready for the next `send`.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use anyhow::Result;
use futures_util::StreamExt;
use reqwest::StatusCode;
use serde::Serialize;
use tokio::sync::mpsc;

use super::decoder::StreamDecoder;
use super::models::{Role, Transcript, Turn};
use crate::api::detail_message;
use crate::auth::TokenSource;

/// Conversation identifier sent when the caller has not selected one.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Substituted for the reply when the chat endpoint rejects the token.
pub const ACCESS_DENIED_NOTICE: &str =
    "**Access Denied.** Please log in again or start a new chat.";

const GENERIC_REQUEST_FAILURE: &str = "Request failed";

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    session_id: &'a str,
}

/// Cooperative cancellation for an in-flight stream. Triggering it ends
/// the read loop at its next suspension point; it does not abort the
/// underlying transfer mid-read.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Use `ChatClient::builder()` to construct a valid `ChatClient`.
pub struct ChatClient {
    base_url: String,
    http: reqwest::Client,
    credentials: Arc<dyn TokenSource + Send + Sync>,
    transcript: Arc<RwLock<Transcript>>,
    cancel: CancelFlag,
    streaming: AtomicBool,
    tx: Option<mpsc::UnboundedSender<String>>,
}

impl ChatClient {
    pub fn builder(
        base_url: &str,
        credentials: Arc<dyn TokenSource + Send + Sync>,
    ) -> ChatClientBuilder {
        ChatClientBuilder::new(base_url, credentials)
    }

    pub fn transcript(&self) -> Arc<RwLock<Transcript>> {
        self.transcript.clone()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    /// Submit one utterance and stream the reply into the transcript.
    ///
    /// A blank utterance is a no-op, as is a call made while a stream is
    /// already open for this transcript (single flight). Failures never
    /// escape: they become content in the open turn per the rules in
    /// `stream_reply`.
    pub async fn send(&self, utterance: &str, conversation_id: Option<&str>) {
        if utterance.trim().is_empty() {
            return;
        }
        if self.streaming.swap(true, Ordering::SeqCst) {
            return;
        }
        self.cancel.clear();

        {
            let mut transcript = self
                .transcript
                .write()
                .expect("Unable to write transcript");
            transcript.append(Turn::new(Role::User, utterance));
            transcript.open_assistant_turn();
        }

        if let Err(err) = self.stream_reply(utterance, conversation_id).await {
            tracing::error!("Chat request failed: {}", err);
            self.set_open_turn(&format!("Error: {}", err));
        }

        // The open turn freezes implicitly at every terminal state
        self.transcript
            .write()
            .expect("Unable to write transcript")
            .close_open_turn();
        self.streaming.store(false, Ordering::SeqCst);
    }

    async fn stream_reply(&self, message: &str, conversation_id: Option<&str>) -> Result<()> {
        let session_id = conversation_id.unwrap_or(DEFAULT_SESSION_ID);
        let payload = ChatRequest {
            message,
            session_id,
        };

        let url = format!("{}/chat", self.base_url);
        let mut request = self.http.post(url).json(&payload);
        // Header injection is an explicit step here so tests can observe it
        if let Some(token) = self.credentials.current_access_token() {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            // Handled locally: no retry, no credential reset, no redirect
            tracing::debug!("Chat endpoint denied access with {}", status);
            self.set_open_turn(ACCESS_DENIED_NOTICE);
            return Ok(());
        }
        if !status.is_success() {
            let detail = detail_message(response)
                .await
                .unwrap_or_else(|| GENERIC_REQUEST_FAILURE.to_string());
            self.set_open_turn(&format!("Error: {}", detail));
            return Ok(());
        }

        let mut decoder = StreamDecoder::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            if self.cancel.is_triggered() {
                // The transcript this stream was feeding is gone; stop
                // reading instead of draining a reply nobody will see
                return Ok(());
            }
            let chunk = chunk?;
            if let Some(fragment) = decoder.decode(&chunk)? {
                self.append_fragment(&fragment);
            }
        }
        if let Some(rest) = decoder.finish() {
            self.append_fragment(&rest);
        }
        Ok(())
    }

    fn append_fragment(&self, fragment: &str) {
        self.transcript
            .write()
            .expect("Unable to write transcript")
            .append_to_open_turn(fragment);
        if let Some(tx) = &self.tx {
            let _ = tx.send(fragment.to_string());
        }
    }

    fn set_open_turn(&self, content: &str) {
        self.transcript
            .write()
            .expect("Unable to write transcript")
            .set_open_turn(content);
        if let Some(tx) = &self.tx {
            let _ = tx.send(content.to_string());
        }
    }
}

pub struct ChatClientBuilder {
    base_url: String,
    http: reqwest::Client,
    credentials: Arc<dyn TokenSource + Send + Sync>,
    transcript: Arc<RwLock<Transcript>>,
    cancel: CancelFlag,
    tx: Option<mpsc::UnboundedSender<String>>,
}

impl ChatClientBuilder {
    pub fn new(base_url: &str, credentials: Arc<dyn TokenSource + Send + Sync>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            credentials,
            transcript: Arc::new(RwLock::new(Transcript::new())),
            cancel: CancelFlag::new(),
            tx: None,
        }
    }

    /// Share a transcript owned by the caller, e.g. the session controller.
    pub fn transcript(mut self, transcript: Arc<RwLock<Transcript>>) -> Self {
        self.transcript = transcript;
        self
    }

    /// Share a cancellation flag owned by the caller.
    pub fn cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Forward every transcript mutation's text to a channel so a
    /// front-end can render fragments as they arrive.
    pub fn subscriber(mut self, tx: mpsc::UnboundedSender<String>) -> Self {
        self.tx = Some(tx);
        self
    }

    pub fn http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn build(self) -> ChatClient {
        ChatClient {
            base_url: self.base_url,
            http: self.http,
            credentials: self.credentials,
            transcript: self.transcript,
            cancel: self.cancel,
            streaming: AtomicBool::new(false),
            tx: self.tx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    struct StaticToken(Option<String>);

    impl TokenSource for StaticToken {
        fn current_access_token(&self) -> Option<String> {
            self.0.clone()
        }
    }

    fn test_client(base_url: &str, token: Option<&str>) -> ChatClient {
        ChatClient::builder(base_url, Arc::new(StaticToken(token.map(str::to_string)))).build()
    }

    fn turn_contents(client: &ChatClient) -> Vec<(Role, String)> {
        client
            .transcript()
            .read()
            .unwrap()
            .turns()
            .iter()
            .map(|t| (t.role, t.content().to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_send_appends_user_and_assistant_turns() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body("Hello!")
            .create();

        let client = test_client(&server.url(), None);
        client.send("Hi", None).await;

        mock.assert();
        let turns = turn_contents(&client);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], (Role::User, "Hi".to_string()));
        assert_eq!(turns[1], (Role::Assistant, "Hello!".to_string()));
        assert!(!client.is_streaming());
        assert!(!client.transcript().read().unwrap().has_open_turn());
    }

    #[tokio::test]
    async fn test_send_assembles_chunked_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_chunked_body(|w| {
                w.write_all(b"The ")?;
                w.write_all(b"video ")?;
                w.write_all(b"covers X.")
            })
            .create();

        let client = test_client(&server.url(), None);
        client.send("Summarize the video", None).await;

        mock.assert();
        let turns = turn_contents(&client);
        assert_eq!(turns[1].1, "The video covers X.");
    }

    #[tokio::test]
    async fn test_send_uses_default_session_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Json(json!({
                "message": "Hi",
                "session_id": "default"
            })))
            .with_status(200)
            .with_body("ok")
            .create();

        let client = test_client(&server.url(), None);
        client.send("Hi", None).await;

        mock.assert();
    }

    #[tokio::test]
    async fn test_send_uses_selected_conversation_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_body(mockito::Matcher::Json(json!({
                "message": "Hi",
                "session_id": "thread-42"
            })))
            .with_status(200)
            .with_body("ok")
            .create();

        let client = test_client(&server.url(), None);
        client.send("Hi", Some("thread-42")).await;

        mock.assert();
    }

    #[tokio::test]
    async fn test_send_attaches_bearer_token_when_present() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_header("authorization", "Bearer token-abc")
            .with_status(200)
            .with_body("ok")
            .create();

        let client = test_client(&server.url(), Some("token-abc"));
        client.send("Hi", None).await;

        mock.assert();
    }

    #[tokio::test]
    async fn test_send_omits_auth_header_without_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_header("authorization", mockito::Matcher::Missing)
            .with_status(200)
            .with_body("ok")
            .create();

        let client = test_client(&server.url(), None);
        client.send("Hi", None).await;

        mock.assert();
    }

    #[tokio::test]
    async fn test_auth_denied_substitutes_fixed_notice() {
        for status in [401, 403] {
            let mut server = mockito::Server::new_async().await;
            let mock = server
                .mock("POST", "/chat")
                .with_status(status)
                .with_body("ignored")
                .expect(1)
                .create();

            let client = test_client(&server.url(), Some("expired"));
            client.send("Hi", None).await;

            mock.assert();
            let turns = turn_contents(&client);
            assert_eq!(turns[1].1, ACCESS_DENIED_NOTICE);
            assert!(!client.is_streaming());
        }
    }

    #[tokio::test]
    async fn test_server_error_surfaces_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat")
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"overloaded"}"#)
            .create();

        let client = test_client(&server.url(), None);
        client.send("Hi", None).await;

        let turns = turn_contents(&client);
        assert!(turns[1].1.starts_with("Error: "));
        assert!(turns[1].1.contains("overloaded"));
    }

    #[tokio::test]
    async fn test_server_error_without_detail_is_generic() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat")
            .with_status(502)
            .with_body("<html>bad gateway</html>")
            .create();

        let client = test_client(&server.url(), None);
        client.send("Hi", None).await;

        let turns = turn_contents(&client);
        assert_eq!(turns[1].1, "Error: Request failed");
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces_description() {
        // Nothing is listening here
        let client = test_client("http://127.0.0.1:1", None);
        client.send("Hi", None).await;

        let turns = turn_contents(&client);
        assert_eq!(turns.len(), 2);
        assert!(turns[1].1.starts_with("Error: "));
        assert!(turns[1].1.len() > "Error: ".len());
        assert!(!client.is_streaming());
    }

    #[tokio::test]
    async fn test_blank_utterance_is_noop() {
        let client = test_client("http://127.0.0.1:1", None);
        client.send("   ", None).await;

        assert!(client.transcript().read().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reentrant_send_is_noop() {
        let client = test_client("http://127.0.0.1:1", None);
        client.streaming.store(true, Ordering::SeqCst);
        client.send("Hi", None).await;

        assert!(client.transcript().read().unwrap().is_empty());
        assert!(client.is_streaming());
    }

    #[tokio::test]
    async fn test_send_recovers_after_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat")
            .match_body(mockito::Matcher::PartialJson(json!({"message": "first"})))
            .with_status(500)
            .with_body("{}")
            .expect(1)
            .create();
        server
            .mock("POST", "/chat")
            .match_body(mockito::Matcher::PartialJson(json!({"message": "second"})))
            .with_status(200)
            .with_body("recovered")
            .expect(1)
            .create();

        let client = test_client(&server.url(), None);
        client.send("first", None).await;
        client.send("second", None).await;

        let turns = turn_contents(&client);
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[3].1, "recovered");
    }

    #[tokio::test]
    async fn test_subscriber_sees_fragments() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat")
            .with_status(200)
            .with_chunked_body(|w| {
                w.write_all(b"one ")?;
                w.write_all(b"two")
            })
            .create();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let client = ChatClient::builder(&server.url(), Arc::new(StaticToken(None)))
            .subscriber(tx)
            .build();
        client.send("Hi", None).await;

        let mut seen = String::new();
        while let Ok(fragment) = rx.try_recv() {
            seen.push_str(&fragment);
        }
        assert_eq!(seen, "one two");
    }
}
