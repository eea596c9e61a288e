// src/models/chat.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    /// Video this conversation is about, if any.
    #[serde(default)]
    pub video: Option<Uuid>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    User,
    Assistant,
    /// The backend can emit system rows; the client never produces them.
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub content: String,
    pub sender: MessageSender,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Locally-synthesized user echo. The id and timestamp are client truth,
    /// not the server row.
    pub fn local_user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            sender: MessageSender::User,
            created_at: Utc::now(),
        }
    }

    pub fn local_assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            sender: MessageSender::Assistant,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest {
    pub content: String,
    pub conversation_id: Option<Uuid>,
    pub video_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
}
