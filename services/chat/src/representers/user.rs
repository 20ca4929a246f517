//! User representation
//!
//! The password is write-only: [`UserInput`] accepts it, while
//! [`UserRepresentation`] has no field it could be written to.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{nullable, required, stored_path, supplied};
use crate::{
    context::RequestContext,
    error::{ApiError, ApiResult, ValidationErrors},
    models::{NewUser, User, UserChanges},
    password::hash_password,
    repositories::UserStore,
    validation::{USERNAME_TAKEN, validate_email, validate_password, validate_username},
};

/// Output schema for a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRepresentation {
    pub id: i64,
    pub username: String,
    /// Absolute URL, stored path, or `""` when the user has no avatar
    pub avatar: String,
    pub email: String,
}

/// Input schema for creating or updating a user
#[derive(Clone, Default, Deserialize)]
pub struct UserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub avatar: Option<Option<String>>,
}

impl fmt::Debug for UserInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserInput")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("avatar", &self.avatar)
            .finish()
    }
}

/// Converts users to and from their exchange representation
pub struct UserRepresenter<'a> {
    users: &'a dyn UserStore,
    context: Option<&'a RequestContext>,
}

impl<'a> UserRepresenter<'a> {
    pub fn new(users: &'a dyn UserStore, context: Option<&'a RequestContext>) -> Self {
        Self { users, context }
    }

    /// Build the output representation of a user
    pub fn represent(&self, user: &User) -> UserRepresentation {
        UserRepresentation {
            id: user.id,
            username: user.username.clone(),
            avatar: self.avatar_url(user),
            email: user.email.clone(),
        }
    }

    fn avatar_url(&self, user: &User) -> String {
        match (user.avatar.as_deref(), self.context) {
            (None, _) => String::new(),
            (Some(path), Some(context)) => context.absolute_url(path),
            (Some(path), None) => path.to_string(),
        }
    }

    async fn check_username_free(
        &self,
        errors: &mut ValidationErrors,
        username: &str,
        owner: Option<i64>,
    ) -> ApiResult<()> {
        if let Some(existing) = self.users.find_by_username(username).await? {
            if Some(existing.id) != owner {
                errors.add("username", USERNAME_TAKEN);
            }
        }
        Ok(())
    }

    /// Register a new user
    ///
    /// The plaintext password is taken out of the input and only its argon2
    /// hash reaches storage.
    pub async fn create(&self, input: UserInput) -> ApiResult<User> {
        let mut errors = ValidationErrors::new();

        let username = required(&mut errors, "username", input.username, |u| {
            validate_username(u)
        });
        let email = required(&mut errors, "email", input.email, |e| validate_email(e));
        let password = required(&mut errors, "password", input.password, |p| {
            validate_password(p)
        });
        let avatar = stored_path(&mut errors, "avatar", input.avatar).flatten();

        if let Some(username) = &username {
            self.check_username_free(&mut errors, username, None).await?;
        }

        let (username, email, password) = match (username, email, password) {
            (Some(username), Some(email), Some(password)) if errors.is_empty() => {
                (username, email, password)
            }
            _ => return Err(ApiError::Validation(errors)),
        };

        let new_user = NewUser {
            username,
            email,
            avatar,
            password_hash: hash_password(&password)?,
        };
        let user = self.users.create(&new_user).await?;

        info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Apply a partial update to an existing user
    ///
    /// A supplied password is hashed before it is stored, like on creation.
    pub async fn update(&self, user: &User, input: UserInput) -> ApiResult<User> {
        let mut errors = ValidationErrors::new();

        let username = input
            .username
            .and_then(|u| supplied(&mut errors, "username", u, |u| validate_username(u)));
        let email = input
            .email
            .and_then(|e| supplied(&mut errors, "email", e, |e| validate_email(e)));
        let password = input
            .password
            .and_then(|p| supplied(&mut errors, "password", p, |p| validate_password(p)));
        let avatar = stored_path(&mut errors, "avatar", input.avatar);

        if let Some(username) = &username {
            self.check_username_free(&mut errors, username, Some(user.id))
                .await?;
        }
        errors.into_result()?;

        let changes = UserChanges {
            username,
            email,
            avatar,
            password_hash: password.as_deref().map(hash_password).transpose()?,
        };

        let updated = self
            .users
            .update(user.id, changes)
            .await?
            .ok_or(ApiError::NotFound)?;

        info!("Updated user {}", updated.id);
        Ok(updated)
    }
}
