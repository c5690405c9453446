//! Conversation payloads: chat turns, generator requests/responses and the
//! shared history entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::Agent;

/// A chat turn published on the conversations topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Author of the turn.
    pub name: String,
    pub message: String,
}

/// Body of `POST /generate` on the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueRequest {
    pub agent: Agent,
    pub message: String,
}

/// Response of `POST /generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueResponse {
    pub content_type: String,
    pub data: String,
}

impl DialogueResponse {
    /// A plain-text response carrying the generated reply.
    pub fn text(data: impl Into<String>) -> Self {
        Self {
            content_type: "text/plain".to_string(),
            data: data.into(),
        }
    }
}

/// One element of the shared conversation history.
///
/// The generator appends the request payload it processed, with the agent
/// snapshot taken after its budget was charged. Entries written by other
/// producers may lack the agent, so it is optional on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Agent>,
    pub message: String,
}

impl From<DialogueRequest> for HistoryEntry {
    fn from(request: DialogueRequest) -> Self {
        Self {
            agent: Some(request.agent),
            message: request.message,
        }
    }
}

/// A conversation turn as relayed to live feed subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEvent {
    pub name: String,
    pub message: String,
    pub received_at: DateTime<Utc>,
}

impl FeedEvent {
    /// Stamp a conversation message with the current time.
    pub fn now(message: &ConversationMessage) -> Self {
        Self {
            name: message.name.clone(),
            message: message.message.clone(),
            received_at: Utc::now(),
        }
    }
}
