use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use udbc_pool::DbError;
use udbc_pool::models::db_config::ConnectionOptions;
use udbc_pool::pool::{BlockingPool, Member, Pool};
use udbc_pool::udbc_mysql::MysqlSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::new("debug")).init();
    let url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "mysql://root@127.0.0.1:3306/mysql".into());
    let options = ConnectionOptions::new(url).timeout(5);
    let pool = BlockingPool::new(MysqlSource::new(&options)?);

    let member = pool.member().await?;
    let conn = member.checkout().connection_async().await?;
    let c = conn.clone();
    tokio::task::spawn_blocking(move || c.ping()).await??;
    info!("ping ok");

    let member = tokio::task::spawn_blocking(move || {
        member.checkin()?;
        member.shutdown();
        Ok::<_, DbError>(member)
    })
    .await??;
    info!(shutdown = member.is_shutdown(), "member released");

    pool.close().await?;
    Ok(())
}
