//! Field-level input validation
//!
//! Each check returns the message to report against the field. Presence
//! ("This field is required.") is decided by the representers, these
//! functions only look at values that were supplied.

use regex::Regex;
use std::sync::OnceLock;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Unique constraint on `users.username`
pub const USERNAME_CONSTRAINT: &str = "users_username_key";

pub const USERNAME_MAX_LENGTH: usize = 150;
pub const EMAIL_MAX_LENGTH: usize = 254;
pub const PASSWORD_MAX_LENGTH: usize = 128;
pub const ROOM_NAME_MAX_LENGTH: usize = 255;
pub const STORED_PATH_MAX_LENGTH: usize = 100;

fn max_length(value: &str, limit: usize) -> Result<(), String> {
    if value.chars().count() > limit {
        return Err(format!(
            "Ensure this field has no more than {} characters.",
            limit
        ));
    }
    Ok(())
}

fn not_blank(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(BLANK.to_string());
    }
    Ok(())
}

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    not_blank(username)?;
    max_length(username, USERNAME_MAX_LENGTH)?;

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    not_blank(email)?;
    max_length(email, EMAIL_MAX_LENGTH)?;

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Enter a valid email address.".to_string());
    }

    Ok(())
}

/// Validate password
///
/// Only presence and length are enforced; strength rules are not part of
/// the registration contract.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err(BLANK.to_string());
    }
    max_length(password, PASSWORD_MAX_LENGTH)
}

/// Validate a room name
pub fn validate_room_name(name: &str) -> Result<(), String> {
    not_blank(name)?;
    max_length(name, ROOM_NAME_MAX_LENGTH)
}

/// Validate a stored media reference (avatar or attachment path)
pub fn validate_stored_path(path: &str) -> Result<(), String> {
    let length = path.chars().count();
    if length > STORED_PATH_MAX_LENGTH {
        return Err(format!(
            "Ensure this filename has at most {} characters (it has {}).",
            STORED_PATH_MAX_LENGTH, length
        ));
    }
    Ok(())
}

/// Message reported for a primary key that resolves to nothing
pub fn missing_pk(id: i64) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}
