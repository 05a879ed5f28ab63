//! Chat composer: an append-only transcript in front of `/api/chat`.

use tracing::{info, warn};

use crate::api::{Backend, ChatReply};
use crate::error::ApiError;
use crate::state::ChatMessage;

pub const WELCOME_MESSAGE: &str = "Hi! Ask me anything about your documents.";
pub const FALLBACK_REPLY: &str = "Sorry, I didn't get a response.";
pub const OFFLINE_MESSAGE: &str = "Unable to reach the assistant. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Online,
    Thinking,
    Offline,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Online => "Online",
            ConnectionStatus::Thinking => "Thinking…",
            ConnectionStatus::Offline => "Offline",
        }
    }
}

pub trait ChatView {
    fn append_message(&mut self, message: &ChatMessage);
    fn reset_transcript(&mut self, messages: &[ChatMessage]);
    fn set_send_enabled(&mut self, enabled: bool);
    fn set_connection(&mut self, status: ConnectionStatus);
}

#[derive(Debug)]
pub struct ChatComposer {
    transcript: Vec<ChatMessage>,
    connection: ConnectionStatus,
    in_flight: bool,
}

impl Default for ChatComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatComposer {
    pub fn new() -> Self {
        Self {
            transcript: vec![ChatMessage::system(WELCOME_MESSAGE)],
            connection: ConnectionStatus::Online,
            in_flight: false,
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    fn set_connection<V: ChatView + ?Sized>(&mut self, status: ConnectionStatus, view: &mut V) {
        self.connection = status;
        view.set_connection(status);
    }

    fn push<V: ChatView + ?Sized>(&mut self, message: ChatMessage, view: &mut V) {
        view.append_message(&message);
        self.transcript.push(message);
    }

    /// Append the user's text and return the message to send.
    ///
    /// Blank input, or input while a reply is pending, is ignored.
    pub fn begin_send<V: ChatView + ?Sized>(&mut self, input: &str, view: &mut V) -> Option<String> {
        let text = input.trim();
        if text.is_empty() || self.in_flight {
            return None;
        }

        self.push(ChatMessage::user(text), view);
        self.in_flight = true;
        view.set_send_enabled(false);
        self.set_connection(ConnectionStatus::Thinking, view);
        Some(text.to_string())
    }

    pub fn finish_send<V: ChatView + ?Sized>(
        &mut self,
        result: Result<ChatReply, ApiError>,
        view: &mut V,
    ) {
        self.in_flight = false;
        view.set_send_enabled(true);

        match result {
            Ok(reply) => {
                let text = reply
                    .reply
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| FALLBACK_REPLY.to_string());
                info!("Chat reply received ({} chars)", text.chars().count());
                self.push(ChatMessage::assistant(text), view);
                self.set_connection(ConnectionStatus::Online, view);
            }
            Err(err) => {
                warn!("Chat request failed: {}", err.body_message());
                self.push(ChatMessage::system(OFFLINE_MESSAGE), view);
                self.set_connection(ConnectionStatus::Offline, view);
            }
        }
    }

    /// Send one message; returns whether a request was issued.
    pub async fn send<B, V>(&mut self, input: &str, backend: &B, view: &mut V) -> bool
    where
        B: Backend + ?Sized,
        V: ChatView + ?Sized,
    {
        let Some(message) = self.begin_send(input, view) else {
            return false;
        };
        let result = backend.chat(&message).await;
        self.finish_send(result, view);
        true
    }

    pub fn clear<V: ChatView + ?Sized>(&mut self, view: &mut V) {
        self.transcript = vec![ChatMessage::system(WELCOME_MESSAGE)];
        view.reset_transcript(&self.transcript);
    }

    /// Record the outcome of a health check as the connection status.
    pub fn apply_health<V: ChatView + ?Sized>(&mut self, result: Result<(), ApiError>, view: &mut V) {
        let status = match result {
            Ok(()) => ConnectionStatus::Online,
            Err(err) => {
                warn!("Health check failed: {}", err);
                ConnectionStatus::Offline
            }
        };
        if !self.in_flight {
            self.set_connection(status, view);
        }
    }

    pub async fn check_health<B, V>(&mut self, backend: &B, view: &mut V)
    where
        B: Backend + ?Sized,
        V: ChatView + ?Sized,
    {
        let result = backend.health().await;
        self.apply_health(result, view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChatRole;
    use crate::testing::{FakeBackend, Recorder};

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let backend = FakeBackend::new();
        let mut chat = ChatComposer::new();
        let mut view = Recorder::default();

        assert!(!chat.send("   \n\t", &backend, &mut view).await);
        assert_eq!(backend.calls(), 0);
        assert!(view.messages.is_empty());
        assert_eq!(chat.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_reply_appends_one_assistant_entry() {
        let backend = FakeBackend::new().chat_returns(Ok(ChatReply {
            reply: Some("hello".to_string()),
        }));
        let mut chat = ChatComposer::new();
        let mut view = Recorder::default();

        assert!(chat.send("  hi there ", &backend, &mut view).await);

        assert_eq!(backend.chatted(), vec!["hi there".to_string()]);
        assert_eq!(
            view.messages,
            vec![ChatMessage::user("hi there"), ChatMessage::assistant("hello")]
        );
        let assistant: Vec<_> = chat
            .transcript()
            .iter()
            .filter(|m| m.role == ChatRole::Assistant)
            .collect();
        assert_eq!(assistant.len(), 1);
        assert_eq!(chat.connection(), ConnectionStatus::Online);
        assert_eq!(view.send_enabled, Some(true));
    }

    #[tokio::test]
    async fn test_missing_reply_uses_fallback() {
        let backend = FakeBackend::new().chat_returns(Ok(ChatReply::default()));
        let mut chat = ChatComposer::new();
        let mut view = Recorder::default();

        chat.send("question", &backend, &mut view).await;

        assert_eq!(view.messages.last(), Some(&ChatMessage::assistant(FALLBACK_REPLY)));
    }

    #[tokio::test]
    async fn test_failure_appends_offline_entry() {
        let backend = FakeBackend::new().chat_returns(Err(ApiError::Status {
            status: 503,
            body: "model unavailable".to_string(),
        }));
        let mut chat = ChatComposer::new();
        let mut view = Recorder::default();

        chat.send("question", &backend, &mut view).await;

        let system: Vec<_> = view
            .messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .collect();
        assert_eq!(system, vec![&ChatMessage::system(OFFLINE_MESSAGE)]);
        assert_eq!(chat.connection(), ConnectionStatus::Offline);
        assert_eq!(view.connection, Some(ConnectionStatus::Offline));
        assert_eq!(view.send_enabled, Some(true));
    }

    #[test]
    fn test_user_entry_is_optimistic_and_blocks_second_send() {
        let mut chat = ChatComposer::new();
        let mut view = Recorder::default();

        assert_eq!(chat.begin_send("first", &mut view), Some("first".to_string()));
        assert_eq!(view.connection, Some(ConnectionStatus::Thinking));
        assert_eq!(view.send_enabled, Some(false));
        assert_eq!(chat.begin_send("second", &mut view), None);
        assert_eq!(chat.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_clear_resets_to_welcome() {
        let backend = FakeBackend::new().chat_returns(Ok(ChatReply {
            reply: Some("hello".to_string()),
        }));
        let mut chat = ChatComposer::new();
        let mut view = Recorder::default();
        chat.send("hi", &backend, &mut view).await;

        chat.clear(&mut view);

        assert_eq!(chat.transcript(), &[ChatMessage::system(WELCOME_MESSAGE)]);
        assert_eq!(view.messages, vec![ChatMessage::system(WELCOME_MESSAGE)]);
    }

    #[tokio::test]
    async fn test_failed_health_check_sets_offline() {
        let backend = FakeBackend::new()
            .health_returns(Err(ApiError::Transport("connection refused".to_string())));
        let mut chat = ChatComposer::new();
        let mut view = Recorder::default();

        chat.check_health(&backend, &mut view).await;

        assert_eq!(chat.connection(), ConnectionStatus::Offline);
    }
}
