//! Conversation state as held by the chat page, plus a client that drives it
//! against a running relay.

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, error};
use reqwest::Client;
use uuid::Uuid;

use serde::Serialize;

use crate::web::models::{ChatResponse, Message, Role};

pub const REPLY_FALLBACK: &str = "Sorry, no answer could be generated.";

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// In-memory transcript. Messages keep insertion order.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    error: Option<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> &ChatMessage {
        self.error = None;
        self.push(ChatMessage::new(Role::User, content))
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) -> &ChatMessage {
        self.push(ChatMessage::new(Role::Assistant, content))
    }

    fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Role/content pairs in send order, as sent alongside a new message.
    pub fn history(&self) -> Vec<Message> {
        self.messages
            .iter()
            .map(|m| Message {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.error = None;
    }
}

#[derive(Debug, Serialize)]
struct OutgoingChat<'a> {
    message: &'a str,
    history: Vec<Message>,
}

pub struct ChatClient {
    relay_url: String,
    client: Client,
    transcript: Transcript,
}

impl ChatClient {
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            relay_url: relay_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
            transcript: Transcript::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Sends one message. Blank input is ignored and returns `None`.
    /// A failed exchange keeps the user turn and records the error on the transcript.
    pub async fn send(&mut self, input: &str) -> Option<String> {
        let content = input.trim();
        if content.is_empty() {
            return None;
        }

        let history = self.transcript.history();
        self.transcript.push_user(content);

        let request = OutgoingChat {
            message: content,
            history,
        };

        match self.post(&request).await {
            Ok(response) => {
                let reply = if response.response.is_empty() {
                    REPLY_FALLBACK.to_string()
                } else {
                    response.response
                };
                self.transcript.push_assistant(reply.clone());
                Some(reply)
            }
            Err(e) => {
                error!("Chat request failed: {:#}", e);
                self.transcript.fail(e.to_string());
                None
            }
        }
    }

    async fn post(&self, request: &OutgoingChat<'_>) -> Result<ChatResponse> {
        let url = format!("{}/api/chat", self.relay_url);
        debug!("Posting chat message with {} prior turns", request.history.len());

        let response = self.client.post(url).json(request).send().await?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!("API error: {}", response.status()));
        }
        Ok(response.json().await?)
    }
}
