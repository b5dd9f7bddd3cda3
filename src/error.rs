use std::sync::Arc;
use thiserror::Error;

/// Represents errors that can occur while sourcing or pooling connections.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("General error: {0}")]
    General(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),
    #[error("Database error: {0}")]
    Database(String),
    /// The member could not materialize its connection. Shared so every
    /// caller of the same member observes the same failure.
    #[error("Failed to acquire connection: {0}")]
    Acquire(#[source] Arc<DbError>),
    #[error("Failed to close connection: {0}")]
    Close(#[source] Box<DbError>),
    #[error("Failed to release connection source: {0}")]
    Release(#[source] Box<DbError>),
}

impl DbError {
    pub(crate) fn close(e: DbError) -> Self {
        DbError::Close(Box::new(e))
    }

    pub(crate) fn release(e: DbError) -> Self {
        DbError::Release(Box::new(e))
    }
}

impl From<tokio::task::JoinError> for DbError {
    fn from(e: tokio::task::JoinError) -> Self {
        DbError::General(format!("blocking task failed: {}", e))
    }
}

#[cfg(feature = "mysql")]
impl From<mysql_async::Error> for DbError {
    fn from(e: mysql_async::Error) -> Self {
        DbError::Database(e.to_string())
    }
}
