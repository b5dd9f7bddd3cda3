pub mod error;
pub mod models;
pub mod pool;
pub mod sink;
pub mod udbc;
#[cfg(feature = "mysql")]
pub mod udbc_mysql;

pub use error::DbError;
pub use pool::{BlockingPool, ConnectionMember, Member, Pool};
