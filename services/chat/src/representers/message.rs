//! Message representation
//!
//! Field-for-field mapping in both directions. `room` and `sender` are
//! primary keys that must resolve on write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{nullable, required, stored_path};
use crate::{
    error::{ApiError, ApiResult, ValidationErrors},
    models::{Message, MessageChanges, NewMessage},
    repositories::{MessageStore, RoomStore, UserStore},
    validation::missing_pk,
};

/// Exchange representation of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRepresentation {
    pub id: i64,
    pub room: i64,
    pub sender: i64,
    pub content: String,
    pub file: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessageRepresentation {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            room: message.room,
            sender: message.sender,
            content: message.content.clone(),
            file: message.file.clone(),
            created_at: message.created_at,
        }
    }
}

impl From<MessageRepresentation> for Message {
    fn from(representation: MessageRepresentation) -> Self {
        Self {
            id: representation.id,
            room: representation.room,
            sender: representation.sender,
            content: representation.content,
            file: representation.file,
            created_at: representation.created_at,
        }
    }
}

/// Input schema for creating or updating a message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageInput {
    pub room: Option<i64>,
    pub sender: Option<i64>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub file: Option<Option<String>>,
}

/// Converts messages to and from their exchange representation
pub struct MessageRepresenter<'a> {
    messages: &'a dyn MessageStore,
    rooms: &'a dyn RoomStore,
    users: &'a dyn UserStore,
}

impl<'a> MessageRepresenter<'a> {
    pub fn new(
        messages: &'a dyn MessageStore,
        rooms: &'a dyn RoomStore,
        users: &'a dyn UserStore,
    ) -> Self {
        Self {
            messages,
            rooms,
            users,
        }
    }

    /// Build the exchange representation of a message
    pub fn represent(&self, message: &Message) -> MessageRepresentation {
        MessageRepresentation::from(message)
    }

    async fn check_room(&self, errors: &mut ValidationErrors, room: i64) -> ApiResult<()> {
        if !self.rooms.exists(room).await? {
            errors.add("room", missing_pk(room));
        }
        Ok(())
    }

    async fn check_sender(&self, errors: &mut ValidationErrors, sender: i64) -> ApiResult<()> {
        if self.users.find_by_id(sender).await?.is_none() {
            errors.add("sender", missing_pk(sender));
        }
        Ok(())
    }

    /// Post a new message
    pub async fn create(&self, input: MessageInput) -> ApiResult<Message> {
        let mut errors = ValidationErrors::new();

        let room = required(&mut errors, "room", input.room, |_| Ok(()));
        let sender = required(&mut errors, "sender", input.sender, |_| Ok(()));
        let file = stored_path(&mut errors, "file", input.file).flatten();

        if let Some(room) = room {
            self.check_room(&mut errors, room).await?;
        }
        if let Some(sender) = sender {
            self.check_sender(&mut errors, sender).await?;
        }

        let (room, sender) = match (room, sender) {
            (Some(room), Some(sender)) if errors.is_empty() => (room, sender),
            _ => return Err(ApiError::Validation(errors)),
        };

        let new_message = NewMessage {
            room,
            sender,
            content: input.content.unwrap_or_default(),
            file,
        };
        let message = self.messages.create(&new_message).await?;

        info!("Message {} posted to room {}", message.id, message.room);
        Ok(message)
    }

    /// Apply a partial update to an existing message
    pub async fn update(&self, message: &Message, input: MessageInput) -> ApiResult<Message> {
        let mut errors = ValidationErrors::new();

        let file = stored_path(&mut errors, "file", input.file);
        if let Some(room) = input.room {
            self.check_room(&mut errors, room).await?;
        }
        if let Some(sender) = input.sender {
            self.check_sender(&mut errors, sender).await?;
        }
        errors.into_result()?;

        let changes = MessageChanges {
            room: input.room,
            sender: input.sender,
            content: input.content,
            file,
        };

        self.messages
            .update(message.id, changes)
            .await?
            .ok_or(ApiError::NotFound)
    }
}
