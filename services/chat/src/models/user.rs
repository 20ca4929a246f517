//! User entity and storage payloads

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// User entity
///
/// Carries only the argon2 hash of the password, never the plaintext.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// New user creation payload
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub password_hash: String,
}

/// User update payload
///
/// `avatar: Some(None)` clears the stored avatar.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<Option<String>>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    /// Apply the changes to an entity in place
    pub fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(avatar) = self.avatar {
            user.avatar = avatar;
        }
        if let Some(password_hash) = self.password_hash {
            user.password_hash = password_hash;
        }
    }
}
