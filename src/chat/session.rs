//! Binds a transcript to a conversation and is the caller-facing entry
//! point for the chat flow.
use std::sync::{Arc, RwLock};

use anyhow::Result;
use tokio::sync::mpsc;

use super::core::{CancelFlag, ChatClient};
use super::models::Transcript;
use crate::api::threads::{self, CreatedThread};
use crate::auth::TokenSource;

/// Exactly one transcript is live at a time. Switching conversations
/// triggers the shared cancellation flag and resets the transcript;
/// whatever the superseded stream still delivers is dropped by the
/// transcript's no-op guard.
pub struct ChatSession {
    base_url: String,
    http: reqwest::Client,
    credentials: Arc<dyn TokenSource + Send + Sync>,
    client: ChatClient,
    transcript: Arc<RwLock<Transcript>>,
    cancel: CancelFlag,
    conversation_id: RwLock<Option<String>>,
}

impl ChatSession {
    pub fn new(
        base_url: &str,
        credentials: Arc<dyn TokenSource + Send + Sync>,
        subscriber: Option<mpsc::UnboundedSender<String>>,
    ) -> Self {
        let http = reqwest::Client::new();
        let transcript = Arc::new(RwLock::new(Transcript::new()));
        let cancel = CancelFlag::new();

        let mut builder = ChatClient::builder(base_url, credentials.clone())
            .http(http.clone())
            .transcript(transcript.clone())
            .cancel_flag(cancel.clone());
        if let Some(tx) = subscriber {
            builder = builder.subscriber(tx);
        }

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            credentials,
            client: builder.build(),
            transcript,
            cancel,
            conversation_id: RwLock::new(None),
        }
    }

    pub fn transcript(&self) -> Arc<RwLock<Transcript>> {
        self.transcript.clone()
    }

    pub fn conversation_id(&self) -> Option<String> {
        self.conversation_id
            .read()
            .expect("Unable to read conversation id")
            .clone()
    }

    pub fn is_streaming(&self) -> bool {
        self.client.is_streaming()
    }

    /// Rebind to a conversation, dropping the current turns. Prior turns
    /// of the selected conversation are not fetched; the transcript picks
    /// up from here.
    pub fn select_conversation(&self, id: Option<String>) {
        self.cancel.trigger();
        self.transcript
            .write()
            .expect("Unable to write transcript")
            .reset();
        *self
            .conversation_id
            .write()
            .expect("Unable to write conversation id") = id;
    }

    /// Request a fresh conversation from the backend and select it.
    pub async fn new_conversation(&self) -> Result<CreatedThread> {
        let token = self.credentials.current_access_token();
        let thread =
            threads::create_thread(&self.http, &self.base_url, token.as_deref()).await?;
        self.select_conversation(Some(thread.thread_id.clone()));
        Ok(thread)
    }

    /// Send one utterance into the currently-selected conversation.
    pub async fn send(&self, utterance: &str) {
        let conversation_id = self.conversation_id();
        self.client.send(utterance, conversation_id.as_deref()).await;
    }
}
