//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(rusqlite::Error),

    /// A row the operation depends on does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The blocking task running a statement failed to complete.
    #[error("storage task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    /// Column values that fail to decode into domain types are `InvalidData`.
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::FromSqlConversionFailure(column, _, err) => {
                StoreError::InvalidData(format!("column {}: {}", column, err))
            }
            rusqlite::Error::IntegralValueOutOfRange(column, value) => {
                StoreError::InvalidData(format!("column {}: {} out of range", column, value))
            }
            other => StoreError::Database(other),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
