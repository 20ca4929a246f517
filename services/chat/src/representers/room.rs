//! Room representation
//!
//! Participants are exchanged by reference, as User ids. Every id is checked
//! against the user collection before the room is written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{required, supplied};
use crate::{
    error::{ApiError, ApiResult, ValidationErrors},
    models::{NewRoom, Room, RoomChanges},
    repositories::{RoomStore, UserStore},
    validation::{missing_pk, validate_room_name},
};

/// Exchange representation of a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRepresentation {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub participants: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<&Room> for RoomRepresentation {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            name: room.name.clone(),
            description: room.description.clone(),
            participants: room.participants.clone(),
            created_at: room.created_at,
        }
    }
}

/// Input schema for creating or updating a room
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub participants: Option<Vec<i64>>,
}

/// Drop repeated ids, keeping the first occurrence
fn dedup_ids(ids: Vec<i64>) -> Vec<i64> {
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

/// Converts rooms to and from their exchange representation
pub struct RoomRepresenter<'a> {
    rooms: &'a dyn RoomStore,
    users: &'a dyn UserStore,
}

impl<'a> RoomRepresenter<'a> {
    pub fn new(rooms: &'a dyn RoomStore, users: &'a dyn UserStore) -> Self {
        Self { rooms, users }
    }

    /// Build the exchange representation of a room
    pub fn represent(&self, room: &Room) -> RoomRepresentation {
        RoomRepresentation::from(room)
    }

    /// Resolve participant ids, reporting each one with no matching user
    async fn resolve_participants(
        &self,
        errors: &mut ValidationErrors,
        participants: Vec<i64>,
    ) -> ApiResult<Option<Vec<i64>>> {
        let participants = dedup_ids(participants);
        let existing = self.users.existing_ids(&participants).await?;

        let mut resolved = true;
        for id in &participants {
            if !existing.contains(id) {
                errors.add("participants", missing_pk(*id));
                resolved = false;
            }
        }

        Ok(resolved.then_some(participants))
    }

    /// Open a new room
    pub async fn create(&self, input: RoomInput) -> ApiResult<Room> {
        let mut errors = ValidationErrors::new();

        let name = required(&mut errors, "name", input.name, |n| validate_room_name(n));
        let participants = match input.participants {
            Some(ids) => self.resolve_participants(&mut errors, ids).await?,
            None => required::<Vec<i64>>(&mut errors, "participants", None, |_| Ok(())),
        };

        let (name, participants) = match (name, participants) {
            (Some(name), Some(participants)) if errors.is_empty() => (name, participants),
            _ => return Err(ApiError::Validation(errors)),
        };

        let new_room = NewRoom {
            name,
            description: input.description.unwrap_or_default(),
            participants,
        };
        let room = self.rooms.create(&new_room).await?;

        info!(
            "Room {} created with {} participants",
            room.id,
            room.participants.len()
        );
        Ok(room)
    }

    /// Apply a partial update to an existing room
    ///
    /// A supplied participant list replaces the current set.
    pub async fn update(&self, room: &Room, input: RoomInput) -> ApiResult<Room> {
        let mut errors = ValidationErrors::new();

        let name = input
            .name
            .and_then(|n| supplied(&mut errors, "name", n, |n| validate_room_name(n)));
        let participants = match input.participants {
            Some(ids) => self.resolve_participants(&mut errors, ids).await?,
            None => None,
        };
        errors.into_result()?;

        let changes = RoomChanges {
            name,
            description: input.description,
            participants,
        };

        let updated = self
            .rooms
            .update(room.id, changes)
            .await?
            .ok_or(ApiError::NotFound)?;

        info!("Room {} updated", updated.id);
        Ok(updated)
    }
}
