pub mod connection;
pub mod source;

pub use connection::Connection;
pub use source::{ConnectionSource, FnSource};
