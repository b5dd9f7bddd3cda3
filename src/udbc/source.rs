use crate::error::DbError;
use crate::udbc::connection::Connection;
use tracing::debug;

/// Blocking factory for physical connections.
///
/// One source is shared by every member issued by a pool, so implementations
/// must be safe to call from several threads at once.
pub trait ConnectionSource: Send + Sync {
    type Connection: Connection + 'static;

    /// Establishes a new physical connection, blocking the calling thread.
    fn acquire(&self) -> Result<Self::Connection, DbError>;

    /// Releases everything the source itself holds. Called once when the
    /// owning pool is closed.
    fn release_all(&self) -> Result<(), DbError>;
}

/// Source backed by a closure. It owns no resources, so releasing it does
/// nothing.
pub struct FnSource<F> {
    factory: F,
}

impl<F, C> FnSource<F>
where
    F: Fn() -> Result<C, DbError> + Send + Sync,
    C: Connection + 'static,
{
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<F, C> ConnectionSource for FnSource<F>
where
    F: Fn() -> Result<C, DbError> + Send + Sync,
    C: Connection + 'static,
{
    type Connection = C;

    fn acquire(&self) -> Result<C, DbError> {
        (self.factory)()
    }

    fn release_all(&self) -> Result<(), DbError> {
        debug!("release_all: closure source holds no resources");
        Ok(())
    }
}
