//! Custom error types for the chat service

use std::{collections::BTreeMap, fmt};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::{
    password::PasswordError,
    validation::{USERNAME_CONSTRAINT, USERNAME_TAKEN},
};

/// Field-keyed validation messages, serialized as `{"field": ["message", ...]}`
///
/// Messages are fixed strings or ids; submitted values (passwords in
/// particular) never end up in them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Custom error type for the chat service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Input failed schema validation
    #[error("Validation failed ({0})")]
    Validation(ValidationErrors),

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Entity does not exist
    #[error("Not found")]
    NotFound,

    /// Password hashing error
    #[error("Password hashing error: {0}")]
    Password(#[from] PasswordError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl ApiError {
    /// Validation error for a single field
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        ApiError::Validation(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::NotFound
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found.".to_string()),
            ApiError::Password(e) => {
                error!("Password hashing failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Database(DatabaseError::UniqueViolation(constraint))
                if constraint == USERNAME_CONSTRAINT =>
            {
                warn!("Username taken by a concurrent write");
                return ApiError::field("username", USERNAME_TAKEN).into_response();
            }
            ApiError::Database(DatabaseError::UniqueViolation(constraint)) => {
                warn!("Unique constraint {} rejected write", constraint);
                (
                    StatusCode::BAD_REQUEST,
                    "A record with these values already exists.".to_string(),
                )
            }
            ApiError::Database(DatabaseError::ForeignKeyViolation(constraint)) => {
                warn!("Foreign key {} rejected write", constraint);
                (
                    StatusCode::BAD_REQUEST,
                    "A referenced object does not exist.".to_string(),
                )
            }
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
        };

        (status, Json(json!({ "detail": body }))).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
