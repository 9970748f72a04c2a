//! Core domain types shared across all concierge crates.
//!
//! Defines the conversation identity, the persisted message model, and the
//! transient per-turn value objects.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConciergeError;

/// Stable external identity of a conversation (a phone number).
///
/// Treated as an opaque string everywhere; the only validation is that it
/// is non-blank. Used as the partition key for all persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Create an id from a raw string, rejecting empty or whitespace-only
    /// values.
    pub fn new(raw: impl Into<String>) -> Result<Self, ConciergeError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ConciergeError::InvalidInput(
                "conversation id cannot be empty".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Author of a message within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Human,
    Assistant,
}

impl Role {
    /// Stable string form used in the database and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Human => "human",
            Role::Assistant => "assistant",
        }
    }

    /// Parse the stable string form back into a role.
    pub fn parse(s: &str) -> Result<Self, ConciergeError> {
        match s {
            "human" => Ok(Role::Human),
            "assistant" => Ok(Role::Assistant),
            other => Err(ConciergeError::Storage(format!(
                "unknown message role: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single immutable message within a conversation.
///
/// `seq` defines the total order within the conversation: monotonically
/// increasing from 0 with no gaps. Human and assistant messages need not
/// strictly alternate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub seq: i64,
}

impl Message {
    pub fn human(content: impl Into<String>, seq: i64) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
            seq,
        }
    }

    pub fn assistant(content: impl Into<String>, seq: i64) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            seq,
        }
    }
}

/// The full ordered message history of one conversation.
///
/// Loaded from the store at the start of a turn and valid only for that
/// turn; it is never mutated in place by callers, only extended by
/// appending whole turns through the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    pub id: ConversationId,
    pub messages: Vec<Message>,
}

impl ConversationState {
    /// An empty history for a conversation that has not spoken yet.
    pub fn empty(id: ConversationId) -> Self {
        Self {
            id,
            messages: Vec::new(),
        }
    }

    /// The next sequence index to assign when appending.
    pub fn next_seq(&self) -> i64 {
        self.messages.last().map(|m| m.seq + 1).unwrap_or(0)
    }

    /// All human message contents, in conversation order.
    pub fn human_texts(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|m| m.role == Role::Human)
            .map(|m| m.content.as_str())
            .collect()
    }

    /// The most recent assistant message, if any.
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// A passage returned by similarity search, alive for one turn only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// File name of the source document (e.g. `contact.md`).
    pub document: String,
    /// Raw passage text.
    pub content: String,
    /// Similarity score as reported by the backend; lower is closer for
    /// distance metrics. Ordering is the backend's, best first.
    pub score: f64,
}

/// Inbound turn: one user message addressed to one conversation.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub conversation_id: ConversationId,
    pub text: String,
}

/// Outbound turn result: the reply produced for the caller.
#[derive(Debug, Clone)]
pub struct TurnReply {
    pub conversation_id: ConversationId,
    pub reply: String,
}
