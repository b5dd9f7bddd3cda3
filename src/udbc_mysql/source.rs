use crate::error::DbError;
use crate::models::db_config::ConnectionOptions;
use crate::udbc::source::ConnectionSource;
use crate::udbc_mysql::bridge::Bridge;
use crate::udbc_mysql::connection::MysqlConnection;
use mysql_async::Pool as MySqlPoolInternal;
use mysql_async::{Opts, OptsBuilder, PoolConstraints, PoolOpts};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const MYSQL_SCHEME: &str = "mysql";

/// Blocking MySQL connection source.
///
/// `mysql_async` runs on a small runtime owned by the source, so `acquire`
/// and `release_all` can be called from any thread, async workers included.
/// They still block the caller; async code should prefer
/// [`ConnectionMember::connection_async`](crate::pool::ConnectionMember::connection_async).
pub struct MysqlSource {
    pool: MySqlPoolInternal,
    bridge: Arc<Bridge>,
    timeout: Option<Duration>,
}

impl MysqlSource {
    pub fn new(options: &ConnectionOptions) -> Result<Self, DbError> {
        match options.scheme() {
            Some(MYSQL_SCHEME) => {}
            _ => return Err(DbError::InvalidDatabaseUrl(options.url.clone())),
        }
        let opts = Opts::from_url(&options.url)
            .map_err(|e| DbError::InvalidDatabaseUrl(e.to_string()))?;
        let constraints = PoolConstraints::new(
            options.max_idle_conns as usize,
            options.max_open_conns as usize,
        )
        .ok_or_else(|| DbError::Database("Invalid pool constraints: min > max".to_string()))?;

        let mut pool_opts = PoolOpts::default().with_constraints(constraints);
        if options.max_lifetime > 0 {
            pool_opts =
                pool_opts.with_inactive_connection_ttl(Duration::from_secs(options.max_lifetime));
        }
        let builder = OptsBuilder::from_opts(opts).pool_opts(pool_opts);

        let bridge = Arc::new(Bridge::new()?);
        let pool = {
            let _guard = bridge.enter();
            MySqlPoolInternal::new(builder)
        };
        Ok(Self {
            pool,
            bridge,
            timeout: (options.timeout > 0).then(|| Duration::from_secs(options.timeout)),
        })
    }
}

impl ConnectionSource for MysqlSource {
    type Connection = MysqlConnection;

    fn acquire(&self) -> Result<MysqlConnection, DbError> {
        let pool = self.pool.clone();
        let timeout = self.timeout;
        let conn = self.bridge.run(async move {
            match timeout {
                Some(limit) => tokio::time::timeout(limit, pool.get_conn())
                    .await
                    .map_err(|_| {
                        DbError::Connection(format!("timed out after {:?} connecting", limit))
                    })?
                    .map_err(DbError::from),
                None => pool.get_conn().await.map_err(DbError::from),
            }
        })??;
        debug!("mysql connection established");
        Ok(MysqlConnection::new(conn, self.bridge.clone()))
    }

    fn release_all(&self) -> Result<(), DbError> {
        info!("disconnecting mysql pool");
        let pool = self.pool.clone();
        self.bridge.run(pool.disconnect())??;
        Ok(())
    }
}
