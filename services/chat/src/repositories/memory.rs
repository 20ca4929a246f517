//! In-process storage backend
//!
//! Enforces the same constraints as the PostgreSQL schema: unique usernames,
//! messages and participants that reference existing rows, and cascading
//! deletes from rooms.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use tokio::sync::RwLock;

use super::{MessageStore, RoomStore, UserStore};
use crate::models::{
    Message, MessageChanges, NewMessage, NewRoom, NewUser, Room, RoomChanges, User, UserChanges,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    rooms: BTreeMap<i64, Room>,
    messages: BTreeMap<i64, Message>,
    last_user_id: i64,
    last_room_id: i64,
    last_message_id: i64,
}

impl Tables {
    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|user| user.username == username && Some(user.id) != except)
    }

    fn check_users(&self, ids: &[i64], constraint: &str) -> DatabaseResult<()> {
        if ids.iter().all(|id| self.users.contains_key(id)) {
            Ok(())
        } else {
            Err(DatabaseError::ForeignKeyViolation(constraint.to_string()))
        }
    }

    fn check_message_refs(&self, room: i64, sender: i64) -> DatabaseResult<()> {
        if !self.rooms.contains_key(&room) {
            return Err(DatabaseError::ForeignKeyViolation(
                "messages_room_id_fkey".to_string(),
            ));
        }
        self.check_users(&[sender], "messages_sender_id_fkey")
    }
}

/// Storage backend holding every table in memory
///
/// Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut tables = self.tables.write().await;
        if tables.username_taken(&new_user.username, None) {
            return Err(DatabaseError::UniqueViolation(
                "users_username_key".to_string(),
            ));
        }

        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            avatar: new_user.avatar.clone(),
            password_hash: new_user.password_hash.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> DatabaseResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(username) = &changes.username {
            if tables.username_taken(username, Some(id)) {
                return Err(DatabaseError::UniqueViolation(
                    "users_username_key".to_string(),
                ));
            }
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(user);
        Ok(Some(user.clone()))
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn list(&self, ids: Option<&[i64]>) -> DatabaseResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|user| ids.is_none_or(|ids| ids.contains(&user.id)))
            .cloned()
            .collect())
    }

    async fn existing_ids(&self, ids: &[i64]) -> DatabaseResult<Vec<i64>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| tables.users.contains_key(id))
            .collect())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create(&self, new_message: &NewMessage) -> DatabaseResult<Message> {
        let mut tables = self.tables.write().await;
        tables.check_message_refs(new_message.room, new_message.sender)?;

        tables.last_message_id += 1;
        let message = Message {
            id: tables.last_message_id,
            room: new_message.room,
            sender: new_message.sender,
            content: new_message.content.clone(),
            file: new_message.file.clone(),
            created_at: Utc::now(),
        };
        tables.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn update(&self, id: i64, changes: MessageChanges) -> DatabaseResult<Option<Message>> {
        let mut tables = self.tables.write().await;
        let Some(mut message) = tables.messages.get(&id).cloned() else {
            return Ok(None);
        };
        changes.apply(&mut message);
        tables.check_message_refs(message.room, message.sender)?;

        tables.messages.insert(id, message.clone());
        Ok(Some(message))
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Message>> {
        Ok(self.tables.read().await.messages.get(&id).cloned())
    }

    async fn list(&self, room: Option<i64>) -> DatabaseResult<Vec<Message>> {
        let tables = self.tables.read().await;
        let mut messages: Vec<Message> = tables
            .messages
            .values()
            .filter(|message| room.is_none_or(|room| message.room == room))
            .cloned()
            .collect();
        messages.sort_by_key(|message| (message.created_at, message.id));
        Ok(messages)
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn create(&self, new_room: &NewRoom) -> DatabaseResult<Room> {
        let mut tables = self.tables.write().await;
        tables.check_users(&new_room.participants, "room_participants_user_id_fkey")?;

        tables.last_room_id += 1;
        let room = Room {
            id: tables.last_room_id,
            name: new_room.name.clone(),
            description: new_room.description.clone(),
            participants: new_room.participants.clone(),
            created_at: Utc::now(),
        };
        tables.rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn update(&self, id: i64, changes: RoomChanges) -> DatabaseResult<Option<Room>> {
        let mut tables = self.tables.write().await;
        if let Some(participants) = &changes.participants {
            tables.check_users(participants, "room_participants_user_id_fkey")?;
        }

        let Some(room) = tables.rooms.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(room);
        Ok(Some(room.clone()))
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Room>> {
        Ok(self.tables.read().await.rooms.get(&id).cloned())
    }

    async fn list(&self) -> DatabaseResult<Vec<Room>> {
        Ok(self.tables.read().await.rooms.values().cloned().collect())
    }

    async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.rooms.remove(&id).is_none() {
            return Ok(false);
        }
        tables.messages.retain(|_, message| message.room != id);
        Ok(true)
    }

    async fn exists(&self, id: i64) -> DatabaseResult<bool> {
        Ok(self.tables.read().await.rooms.contains_key(&id))
    }
}
