//! Application state shared across handlers

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    config::Settings,
    repositories::{
        MemoryStore, MessageStore, PgMessageRepository, PgRoomRepository, PgUserRepository,
        RoomStore, UserStore,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub messages: Arc<dyn MessageStore>,
    pub rooms: Arc<dyn RoomStore>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// State backed by PostgreSQL repositories sharing one pool
    pub fn postgres(pool: PgPool, settings: Settings) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            messages: Arc::new(PgMessageRepository::new(pool.clone())),
            rooms: Arc::new(PgRoomRepository::new(pool)),
            settings: Arc::new(settings),
        }
    }

    /// State backed by a single in-memory store
    pub fn in_memory(store: MemoryStore, settings: Settings) -> Self {
        Self {
            users: Arc::new(store.clone()),
            messages: Arc::new(store.clone()),
            rooms: Arc::new(store),
            settings: Arc::new(settings),
        }
    }
}
