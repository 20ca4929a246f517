//! Message storage

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use tracing::info;

use crate::models::{Message, MessageChanges, NewMessage};

/// Storage interface for messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new message
    async fn create(&self, new_message: &NewMessage) -> DatabaseResult<Message>;

    /// Apply changes to an existing message, `None` when it does not exist
    async fn update(&self, id: i64, changes: MessageChanges) -> DatabaseResult<Option<Message>>;

    /// Find a message by ID
    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Message>>;

    /// List messages in posting order, restricted to one room when given
    async fn list(&self, room: Option<i64>) -> DatabaseResult<Vec<Message>>;
}

/// PostgreSQL implementation of MessageStore
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new message repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageRepository {
    async fn create(&self, new_message: &NewMessage) -> DatabaseResult<Message> {
        info!(
            "Creating message in room {} from user {}",
            new_message.room, new_message.sender
        );

        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (room_id, sender_id, content, file)
            VALUES ($1, $2, $3, $4)
            RETURNING id, room_id, sender_id, content, file, created_at
            "#,
        )
        .bind(new_message.room)
        .bind(new_message.sender)
        .bind(&new_message.content)
        .bind(&new_message.file)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn update(&self, id: i64, changes: MessageChanges) -> DatabaseResult<Option<Message>> {
        info!("Updating message: {}", id);

        let mut tx = self.pool.begin().await.map_err(DatabaseError::Query)?;

        let message = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, room_id, sender_id, content, file, created_at
            FROM messages
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DatabaseError::from_query)?;

        let Some(mut message) = message else {
            return Ok(None);
        };
        changes.apply(&mut message);

        sqlx::query(
            r#"
            UPDATE messages
            SET room_id = $2, sender_id = $3, content = $4, file = $5
            WHERE id = $1
            "#,
        )
        .bind(message.id)
        .bind(message.room)
        .bind(message.sender)
        .bind(&message.content)
        .bind(&message.file)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from_query)?;

        tx.commit().await.map_err(DatabaseError::Query)?;
        Ok(Some(message))
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Message>> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, room_id, sender_id, content, file, created_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn list(&self, room: Option<i64>) -> DatabaseResult<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, room_id, sender_id, content, file, created_at
            FROM messages
            WHERE $1::BIGINT IS NULL OR room_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(room)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }
}
