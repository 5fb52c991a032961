//! Conversation session and request dispatch
//!
//! Both outbound operations are split in two halves so a front end can run
//! the request on its own task:
//!
//! - `begin_*` validates the input and applies the optimistic state change
//!   synchronously, returning the payload to send (or `None` for a no-op).
//! - `finish_*` folds the outcome back into the session and always clears
//!   the in-flight flag.
//!
//! [`Session::send`] and [`Session::ingest`] chain the two halves around a
//! [`BackendClient`] call for callers that can simply await.

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::state::{ChatMessage, Conversation};

pub const INGEST_SUCCESS: &str = "Memory Update Successful";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// Blocking message that the front end must show until dismissed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

pub struct Session {
    conversation: Conversation,
    /// Chat input buffer
    pub draft: String,
    /// Knowledge ingest buffer
    pub ingest_draft: String,
    loading: bool,
    ingesting: bool,
    notice: Option<Notice>,
    backend_url: String,
}

impl Session {
    pub fn new(backend_url: &str) -> Self {
        Self::with_conversation(backend_url, Conversation::new())
    }

    pub fn with_conversation(backend_url: &str, conversation: Conversation) -> Self {
        Self {
            conversation,
            draft: String::new(),
            ingest_draft: String::new(),
            loading: false,
            ingesting: false,
            notice: None,
            backend_url: backend_url.to_string(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.conversation.messages()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_ingesting(&self) -> bool {
        self.ingesting
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Whether the send affordance should be enabled
    pub fn can_send(&self) -> bool {
        !self.loading && !self.draft.trim().is_empty()
    }

    /// Optimistic half of a chat send.
    ///
    /// Appends the user message verbatim, clears the draft and marks the
    /// session as loading. Blank input, or a send while another is still in
    /// flight, is ignored.
    pub fn begin_send(&mut self, text: &str) -> Option<String> {
        if text.trim().is_empty() || self.loading {
            return None;
        }

        let message = text.to_string();
        self.conversation.push(ChatMessage::user(message.clone()));
        self.draft.clear();
        self.loading = true;
        Some(message)
    }

    /// Send whatever is in the chat draft
    pub fn begin_send_draft(&mut self) -> Option<String> {
        let text = self.draft.clone();
        self.begin_send(&text)
    }

    pub fn finish_send(&mut self, outcome: Result<String, BackendError>) {
        self.loading = false;

        let content = match outcome {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(status = ?err.status(), error = %err, "chat request failed");
                self.alert_text(&err)
            }
        };
        self.conversation.push(ChatMessage::assistant(content));
    }

    pub async fn send(&mut self, client: &BackendClient, text: &str) {
        if let Some(message) = self.begin_send(text) {
            let outcome = client.chat(&message).await;
            self.finish_send(outcome);
        }
    }

    /// Optimistic half of an ingest. The draft is left untouched until the
    /// backend accepts the text.
    pub fn begin_ingest(&mut self, text: &str) -> Option<String> {
        if text.trim().is_empty() || self.ingesting {
            return None;
        }

        self.ingesting = true;
        Some(text.to_string())
    }

    pub fn begin_ingest_draft(&mut self) -> Option<String> {
        let text = self.ingest_draft.clone();
        self.begin_ingest(&text)
    }

    pub fn finish_ingest(&mut self, outcome: Result<(), BackendError>) {
        self.ingesting = false;

        self.notice = Some(match outcome {
            Ok(()) => {
                self.ingest_draft.clear();
                Notice {
                    kind: NoticeKind::Success,
                    text: INGEST_SUCCESS.to_string(),
                }
            }
            Err(err) => {
                tracing::warn!(status = ?err.status(), error = %err, "ingest request failed");
                Notice {
                    kind: NoticeKind::Failure,
                    text: format!("Failed to ingest data: {}", err),
                }
            }
        });
    }

    pub async fn ingest(&mut self, client: &BackendClient, text: &str) {
        if let Some(text) = self.begin_ingest(text) {
            let outcome = client.ingest(&text).await;
            self.finish_ingest(outcome);
        }
    }

    /// Assistant-role text shown in place of a reply when a chat call fails
    pub fn alert_text(&self, err: &BackendError) -> String {
        let reason = match err.detail() {
            Some(detail) => format!("Error: {}", detail),
            None => format!(
                "Network Error: Ensure backend is reachable at {}.",
                self.backend_url
            ),
        };
        format!("⚠️ **System Alert**: {}", reason)
    }
}
