//! Error types for the database layer.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Database error types.
#[derive(Debug, Error, Diagnostic)]
pub enum DbError {
    /// SQLite/sqlx error
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    #[diagnostic(help("The queue schema could not be created or upgraded"))]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// IO error (purging or preparing a database file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid data
    #[error("Invalid data: {message}")]
    InvalidData { message: String },
}

impl DbError {
    /// Create an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Whether this error came from using a pool after it was closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Sqlx(sqlx::Error::PoolClosed))
    }
}
