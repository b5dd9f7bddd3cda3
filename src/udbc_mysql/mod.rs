mod bridge;
pub mod connection;
pub mod source;

pub use connection::MysqlConnection;
pub use source::MysqlSource;
