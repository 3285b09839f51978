//! Error types for the database layer

use taskdesk_chats::ChatError;
use thiserror::Error;

/// Result type alias for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// General database error
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database query error: {0}")]
    QueryError(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DatabaseError::Duplicate(db.message().to_string())
            }
            sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } => {
                DatabaseError::CorruptRow(err.to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionError(err.to_string())
            }
            _ => DatabaseError::QueryError(err.to_string()),
        }
    }
}

impl From<DatabaseError> for ChatError {
    fn from(err: DatabaseError) -> Self {
        ChatError::persistence(err.to_string())
    }
}
