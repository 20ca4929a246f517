//! Room storage
//!
//! Participants live in `room_participants`, one row per member with a
//! `position` that preserves the order they were added in.

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::info;

use crate::models::{NewRoom, Room, RoomChanges};

/// Storage interface for rooms
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Persist a new room together with its participants
    async fn create(&self, new_room: &NewRoom) -> DatabaseResult<Room>;

    /// Apply changes to an existing room, `None` when it does not exist
    async fn update(&self, id: i64, changes: RoomChanges) -> DatabaseResult<Option<Room>>;

    /// Find a room by ID
    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Room>>;

    /// List all rooms ordered by ID
    async fn list(&self) -> DatabaseResult<Vec<Room>>;

    /// Delete a room, its participant rows and its messages
    async fn delete(&self, id: i64) -> DatabaseResult<bool>;

    /// Whether a room with this ID exists
    async fn exists(&self, id: i64) -> DatabaseResult<bool>;
}

/// PostgreSQL implementation of RoomStore
#[derive(Clone)]
pub struct PgRoomRepository {
    pool: PgPool,
}

const SELECT_ROOMS: &str = r#"
    SELECT r.id, r.name, r.description, r.created_at,
           COALESCE(
               ARRAY_AGG(p.user_id ORDER BY p.position) FILTER (WHERE p.user_id IS NOT NULL),
               '{}'
           ) AS participants
    FROM rooms r
    LEFT JOIN room_participants p ON p.room_id = r.id
"#;

async fn insert_participants(
    conn: &mut PgConnection,
    room_id: i64,
    participants: &[i64],
) -> DatabaseResult<()> {
    sqlx::query(
        r#"
        INSERT INTO room_participants (room_id, user_id, position)
        SELECT $1, t.user_id, (t.ord - 1)::INTEGER
        FROM UNNEST($2::BIGINT[]) WITH ORDINALITY AS t(user_id, ord)
        "#,
    )
    .bind(room_id)
    .bind(participants)
    .execute(conn)
    .await
    .map_err(DatabaseError::from_query)?;

    Ok(())
}

impl PgRoomRepository {
    /// Create a new room repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomStore for PgRoomRepository {
    async fn create(&self, new_room: &NewRoom) -> DatabaseResult<Room> {
        info!(
            "Creating room {} with {} participants",
            new_room.name,
            new_room.participants.len()
        );

        let mut tx = self.pool.begin().await.map_err(DatabaseError::Query)?;

        let (id, created_at) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            r#"
            INSERT INTO rooms (name, description)
            VALUES ($1, $2)
            RETURNING id, created_at
            "#,
        )
        .bind(&new_room.name)
        .bind(&new_room.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(DatabaseError::from_query)?;

        insert_participants(&mut *tx, id, &new_room.participants).await?;

        tx.commit().await.map_err(DatabaseError::Query)?;

        Ok(Room {
            id,
            name: new_room.name.clone(),
            description: new_room.description.clone(),
            participants: new_room.participants.clone(),
            created_at,
        })
    }

    async fn update(&self, id: i64, changes: RoomChanges) -> DatabaseResult<Option<Room>> {
        info!("Updating room: {}", id);

        let mut tx = self.pool.begin().await.map_err(DatabaseError::Query)?;

        let row = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(
            r#"
            SELECT name, description, created_at
            FROM rooms
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DatabaseError::from_query)?;

        let Some((name, description, created_at)) = row else {
            return Ok(None);
        };

        let participants = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM room_participants WHERE room_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(DatabaseError::from_query)?;

        let mut room = Room {
            id,
            name,
            description,
            participants,
            created_at,
        };
        let replaces_participants = changes.participants.is_some();
        changes.apply(&mut room);

        sqlx::query("UPDATE rooms SET name = $2, description = $3 WHERE id = $1")
            .bind(id)
            .bind(&room.name)
            .bind(&room.description)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from_query)?;

        if replaces_participants {
            sqlx::query("DELETE FROM room_participants WHERE room_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(DatabaseError::from_query)?;
            insert_participants(&mut *tx, id, &room.participants).await?;
        }

        tx.commit().await.map_err(DatabaseError::Query)?;
        Ok(Some(room))
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Room>> {
        let query = format!("{} WHERE r.id = $1 GROUP BY r.id", SELECT_ROOMS);
        sqlx::query_as::<_, Room>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn list(&self) -> DatabaseResult<Vec<Room>> {
        let query = format!("{} GROUP BY r.id ORDER BY r.id", SELECT_ROOMS);
        sqlx::query_as::<_, Room>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        info!("Deleting room: {}", id);

        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, id: i64) -> DatabaseResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM rooms WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }
}
