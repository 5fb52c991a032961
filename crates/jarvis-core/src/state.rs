//! UI-agnostic application state types
//!
//! This module contains data structures that are shared between the session
//! logic and any front end, and don't depend on any specific UI framework.

use serde::{Deserialize, Serialize};

/// Greeting seeded into every new conversation
pub const DEFAULT_GREETING: &str = "Hello sir. Jarvis is online. How can I assist you today?";

/// A chat message in the assistant conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Backend liveness as last observed by the connectivity monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Online,
    Offline,
}

impl ConnectionStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, ConnectionStatus::Online)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Unknown => "Checking...",
            ConnectionStatus::Online => "Systems Nominal",
            ConnectionStatus::Offline => "Connection Lost",
        }
    }
}

/// Append-only message log.
///
/// Always holds at least the seeded greeting; messages are never edited or
/// removed once pushed.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_greeting(DEFAULT_GREETING)
    }

    pub fn with_greeting(greeting: &str) -> Self {
        Self {
            messages: vec![ChatMessage::assistant(greeting)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// The store never drops below the greeting, so this is always false.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// True while nothing but the greeting has been exchanged
    pub fn is_pristine(&self) -> bool {
        self.len() == 1
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
