//! Error types for the database layer shared by the chat services

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A foreign key pointed at a row that does not exist
    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Classify a query failure, separating constraint violations from other errors
    pub fn from_query(error: SqlxError) -> Self {
        if let Some(db_error) = error.as_database_error() {
            let constraint = db_error.constraint().unwrap_or("unknown").to_string();
            if db_error.is_unique_violation() {
                return DatabaseError::UniqueViolation(constraint);
            }
            if db_error.is_foreign_key_violation() {
                return DatabaseError::ForeignKeyViolation(constraint);
            }
        }
        DatabaseError::Query(error)
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_stay_query_errors() {
        let error = DatabaseError::from_query(SqlxError::RowNotFound);
        assert!(matches!(error, DatabaseError::Query(SqlxError::RowNotFound)));
    }

    #[test]
    fn test_error_messages() {
        let error = DatabaseError::UniqueViolation("users_username_key".to_string());
        assert_eq!(
            error.to_string(),
            "Unique constraint violated: users_username_key"
        );
    }
}
