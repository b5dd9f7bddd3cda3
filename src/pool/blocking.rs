use crate::error::DbError;
use crate::pool::{Member, Pool};
use crate::sink::{ErrorSink, TracingSink};
use crate::udbc::connection::Connection;
use crate::udbc::source::ConnectionSource;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering, fence};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{debug, info};

static MEMBER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Holds the outcome of the one and only acquire attempt of a member.
type Slot<C> = OnceLock<Result<Arc<C>, Arc<DbError>>>;

/// Pool adapter over a blocking [`ConnectionSource`].
///
/// Members are cheap to create and connect lazily, on first call to
/// [`ConnectionMember::connection`]. Checking a member in closes its
/// connection, so every checkout consumes one physical connection.
pub struct BlockingPool<S> {
    source: Arc<S>,
    sink: Arc<dyn ErrorSink>,
}

pub struct BlockingPoolBuilder<S> {
    source: S,
    sink: Option<Arc<dyn ErrorSink>>,
}

impl<S: ConnectionSource + 'static> BlockingPoolBuilder<S> {
    /// Where shutdown-time close failures go. Defaults to [`TracingSink`].
    pub fn error_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    pub fn build(self) -> BlockingPool<S> {
        BlockingPool {
            source: Arc::new(self.source),
            sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
        }
    }
}

impl<S: ConnectionSource + 'static> BlockingPool<S> {
    pub fn new(source: S) -> Self {
        Self::builder(source).build()
    }

    pub fn builder(source: S) -> BlockingPoolBuilder<S> {
        BlockingPoolBuilder { source, sink: None }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[async_trait]
impl<S> Pool for BlockingPool<S>
where
    S: ConnectionSource + 'static,
{
    type Member = ConnectionMember<S>;

    async fn member(&self) -> Result<ConnectionMember<S>, DbError> {
        Ok(ConnectionMember::new(self.source.clone(), self.sink.clone()))
    }

    /// Releases the source. Members already handed out are left to the pool
    /// framework to shut down.
    async fn close(&self) -> Result<(), DbError> {
        info!("closing connection source");
        let source = self.source.clone();
        tokio::task::spawn_blocking(move || source.release_all())
            .await?
            .map_err(DbError::release)
    }
}

/// A pool member wrapping at most one physical connection.
///
/// The member starts empty, becomes live once its connection is
/// materialized and ends after [`Member::shutdown`]. It never connects twice:
/// if the only acquire attempt fails, the member stays broken.
pub struct ConnectionMember<S: ConnectionSource> {
    id: u64,
    source: Arc<S>,
    state: Arc<MemberState<S::Connection>>,
}

struct MemberState<C> {
    slot: Slot<C>,
    shutdown: AtomicBool,
    // set by whichever of shutdown or a late materialize closes the connection
    reaped: AtomicBool,
    sink: Arc<dyn ErrorSink>,
}

impl<C: Connection> MemberState<C> {
    fn held(&self) -> Option<Arc<C>> {
        self.slot.get().and_then(|r| r.as_ref().ok()).cloned()
    }

    /// Closes the connection on behalf of shutdown, at most once.
    fn reap(&self, id: u64, conn: &C) {
        if self.reaped.swap(true, Ordering::SeqCst) {
            return;
        }
        if conn.is_closed() {
            debug!(member = id, "shutdown: connection already closed");
            return;
        }
        if let Err(e) = conn.close() {
            self.sink.on_error(&DbError::close(e));
        }
    }
}

impl<S: ConnectionSource + 'static> ConnectionMember<S> {
    fn new(source: Arc<S>, sink: Arc<dyn ErrorSink>) -> Self {
        let id = MEMBER_SEQ.fetch_add(1, Ordering::Relaxed);
        debug!(member = id, "member created");
        Self {
            id,
            source,
            state: Arc::new(MemberState {
                slot: OnceLock::new(),
                shutdown: AtomicBool::new(false),
                reaped: AtomicBool::new(false),
                sink,
            }),
        }
    }

    /// Returns the member's connection, creating it on first call.
    ///
    /// Blocks the calling thread while the source connects. Concurrent first
    /// callers wait for the single acquire in flight and all see its result.
    /// A connection published after [`Member::shutdown`] is closed right away.
    pub fn connection(&self) -> Result<Arc<S::Connection>, DbError> {
        Self::materialize(self.id, &self.source, &self.state)
    }

    /// Like [`connection`](Self::connection), but connects on tokio's
    /// blocking pool so the calling task's worker thread stays free.
    pub async fn connection_async(&self) -> Result<Arc<S::Connection>, DbError> {
        if let Some(outcome) = self.state.slot.get() {
            return outcome.clone().map_err(DbError::Acquire);
        }
        let id = self.id;
        let source = self.source.clone();
        let state = self.state.clone();
        tokio::task::spawn_blocking(move || Self::materialize(id, &source, &state)).await?
    }

    pub fn is_materialized(&self) -> bool {
        self.state.slot.get().is_some()
    }

    fn materialize(
        id: u64,
        source: &S,
        state: &MemberState<S::Connection>,
    ) -> Result<Arc<S::Connection>, DbError> {
        let outcome = state
            .slot
            .get_or_init(|| {
                let start = Instant::now();
                let outcome = source.acquire().map(Arc::new).map_err(Arc::new);
                let err = outcome.as_ref().err().map(|e| e.to_string());
                debug!(member = id, elapsed = ?start.elapsed(), ?err, "connection materialized");
                outcome
            })
            .clone()
            .map_err(DbError::Acquire)?;
        // pairs with the fence in shutdown: one side always sees the other
        fence(Ordering::SeqCst);
        if state.shutdown.load(Ordering::SeqCst) {
            state.reap(id, &outcome);
        }
        Ok(outcome)
    }
}

impl<S: ConnectionSource + 'static> Member for ConnectionMember<S> {
    type Value = Arc<S::Connection>;

    fn checkout(&self) -> &Self {
        self
    }

    /// Closes the held connection; it is not reused.
    fn checkin(&self) -> Result<(), DbError> {
        let Some(conn) = self.state.held() else {
            debug!(member = self.id, "checkin: no connection held");
            return Ok(());
        };
        conn.close().map_err(DbError::close)?;
        debug!(member = self.id, "checkin: connection closed");
        Ok(())
    }

    fn shutdown(&self) {
        self.state.shutdown.store(true, Ordering::SeqCst);
        fence(Ordering::SeqCst);
        if let Some(conn) = self.state.held() {
            self.state.reap(self.id, &conn);
        }
        debug!(member = self.id, "member shut down");
    }

    fn is_shutdown(&self) -> bool {
        self.state.shutdown.load(Ordering::SeqCst)
    }

    fn value(&self) -> Option<Arc<S::Connection>> {
        self.state.held()
    }
}
