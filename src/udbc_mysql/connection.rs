use mysql_async::Conn;
use mysql_async::prelude::Queryable;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::DbError;
use crate::udbc::connection::Connection;
use crate::udbc_mysql::bridge::Bridge;

/// Blocking handle over one `mysql_async` connection.
pub struct MysqlConnection {
    conn: Mutex<Option<Conn>>,
    bridge: Arc<Bridge>,
}

impl MysqlConnection {
    pub(crate) fn new(conn: Conn, bridge: Arc<Bridge>) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
            bridge,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Conn>>, DbError> {
        self.conn
            .lock()
            .map_err(|e| DbError::General(format!("connection lock poisoned: {}", e)))
    }

    pub fn ping(&self) -> Result<(), DbError> {
        self.with_conn(|mut conn| async move {
            let r = conn.ping().await;
            (conn, r)
        })
    }

    pub fn query_drop(&self, sql: &str) -> Result<(), DbError> {
        let sql = sql.to_string();
        self.with_conn(|mut conn| async move {
            let r = conn.query_drop(sql).await;
            (conn, r)
        })
    }

    /// Lends the connection to a task on the bridge and puts it back after.
    /// If the task never reports back the connection is gone and counts as
    /// closed.
    fn with_conn<F, Fut>(&self, f: F) -> Result<(), DbError>
    where
        F: FnOnce(Conn) -> Fut,
        Fut: Future<Output = (Conn, Result<(), mysql_async::Error>)> + Send + 'static,
    {
        let mut guard = self.lock()?;
        let conn = guard.take().ok_or_else(closed)?;
        let (conn, result) = self.bridge.run(f(conn))?;
        *guard = Some(conn);
        result?;
        Ok(())
    }
}

fn closed() -> DbError {
    DbError::Connection("connection already closed".to_string())
}

impl Connection for MysqlConnection {
    fn close(&self) -> Result<(), DbError> {
        let conn = self.lock()?.take().ok_or_else(closed)?;
        self.bridge.run(conn.disconnect())??;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.conn.lock().map(|c| c.is_none()).unwrap_or(true)
    }
}

impl Drop for MysqlConnection {
    fn drop(&mut self) {
        // an unclosed Conn returns itself to its pool on drop, which spawns
        if let Ok(slot) = self.conn.get_mut() {
            if let Some(conn) = slot.take() {
                let _guard = self.bridge.enter();
                drop(conn);
            }
        }
    }
}
