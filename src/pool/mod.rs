//! Contracts a generic resource pool expects from the resources it manages.
//!
//! A [`Pool`] hands out [`Member`]s asynchronously; the pool framework then
//! drives each member through checkout, checkin and shutdown. Queueing,
//! sizing and retry policies live in the framework, not here.

pub mod blocking;

use crate::error::DbError;
use async_trait::async_trait;

pub use blocking::{BlockingPool, BlockingPoolBuilder, ConnectionMember};

/// One pool-managed resource and its lifecycle.
pub trait Member: Send + Sync {
    type Value;

    /// Marks the member as in use and hands it back.
    fn checkout(&self) -> &Self;

    /// Returns the member's resource after use.
    fn checkin(&self) -> Result<(), DbError>;

    /// Permanently releases the member's resource. Never fails; problems
    /// are reported elsewhere.
    fn shutdown(&self);

    fn is_shutdown(&self) -> bool;

    /// The resource currently held, if any. Must not create it.
    fn value(&self) -> Option<Self::Value>;
}

/// Produces members on demand.
#[async_trait]
pub trait Pool: Send + Sync {
    type Member: Member;

    /// Creates a new member. Nothing runs until the returned future is polled.
    async fn member(&self) -> Result<Self::Member, DbError>;

    /// Tears down whatever the pool holds outside of its members.
    async fn close(&self) -> Result<(), DbError>;
}
