use crate::error::DbError;

/// A single physical database connection.
///
/// Calls may block on I/O. Whatever protocol the connection speaks is up to
/// the implementor; the pool only needs to be able to close it.
pub trait Connection: Send + Sync {
    /// Closes the physical connection. Closing an already closed connection
    /// may fail.
    fn close(&self) -> Result<(), DbError>;

    /// Whether [`close`](Self::close) has already run. Shutdown uses it to
    /// skip closing a connection that checkin already consumed.
    fn is_closed(&self) -> bool;
}
