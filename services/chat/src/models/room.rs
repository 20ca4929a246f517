//! Room entity and storage payloads

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Room entity
///
/// `participants` holds User ids in the order they were first added.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub participants: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

/// New room creation payload
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub name: String,
    pub description: String,
    pub participants: Vec<i64>,
}

/// Room update payload
#[derive(Debug, Clone, Default)]
pub struct RoomChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub participants: Option<Vec<i64>>,
}

impl RoomChanges {
    /// Apply the changes to an entity in place
    pub fn apply(self, room: &mut Room) {
        if let Some(name) = self.name {
            room.name = name;
        }
        if let Some(description) = self.description {
            room.description = description;
        }
        if let Some(participants) = self.participants {
            room.participants = participants;
        }
    }
}
