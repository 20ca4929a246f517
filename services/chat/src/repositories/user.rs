//! User storage

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::models::{NewUser, User, UserChanges};

/// Storage interface for users
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;

    /// Apply changes to an existing user, `None` when it does not exist
    async fn update(&self, id: i64, changes: UserChanges) -> DatabaseResult<Option<User>>;

    /// Find a user by ID
    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>>;

    /// List users ordered by ID, restricted to `ids` when given
    async fn list(&self, ids: Option<&[i64]>) -> DatabaseResult<Vec<User>>;

    /// The subset of `ids` that belong to stored users
    async fn existing_ids(&self, ids: &[i64]) -> DatabaseResult<Vec<i64>>;
}

/// PostgreSQL implementation of UserStore
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.username);

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, avatar, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, avatar, password_hash, created_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.avatar)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> DatabaseResult<Option<User>> {
        info!("Updating user: {}", id);

        let mut tx = self.pool.begin().await.map_err(DatabaseError::Query)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, avatar, password_hash, created_at
            FROM users
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DatabaseError::from_query)?;

        let Some(mut user) = user else {
            return Ok(None);
        };
        changes.apply(&mut user);

        sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, avatar = $4, password_hash = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.avatar)
        .bind(&user.password_hash)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from_query)?;

        tx.commit().await.map_err(DatabaseError::Query)?;
        Ok(Some(user))
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        debug!("Finding user by ID: {}", id);

        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, avatar, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        debug!("Finding user by username: {}", username);

        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, avatar, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn list(&self, ids: Option<&[i64]>) -> DatabaseResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, avatar, password_hash, created_at
            FROM users
            WHERE $1::BIGINT[] IS NULL OR id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)
    }

    async fn existing_ids(&self, ids: &[i64]) -> DatabaseResult<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }
}
