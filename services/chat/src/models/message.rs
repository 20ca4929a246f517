//! Message entity and storage payloads

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Message entity
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Message {
    pub id: i64,
    #[sqlx(rename = "room_id")]
    pub room: i64,
    #[sqlx(rename = "sender_id")]
    pub sender: i64,
    pub content: String,
    pub file: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New message creation payload
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub room: i64,
    pub sender: i64,
    pub content: String,
    pub file: Option<String>,
}

/// Message update payload
#[derive(Debug, Clone, Default)]
pub struct MessageChanges {
    pub room: Option<i64>,
    pub sender: Option<i64>,
    pub content: Option<String>,
    pub file: Option<Option<String>>,
}

impl MessageChanges {
    /// Apply the changes to an entity in place
    pub fn apply(self, message: &mut Message) {
        if let Some(room) = self.room {
            message.room = room;
        }
        if let Some(sender) = self.sender {
            message.sender = sender;
        }
        if let Some(content) = self.content {
            message.content = content;
        }
        if let Some(file) = self.file {
            message.file = file;
        }
    }
}
