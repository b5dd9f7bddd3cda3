use std::future::Future;
use std::sync::mpsc;
use tokio::runtime::{Builder, EnterGuard, Handle, Runtime, RuntimeFlavor};

use crate::error::DbError;

/// Private runtime that drives `mysql_async` for blocking callers.
///
/// Futures are spawned onto the bridge's own worker and the caller waits on a
/// channel, so a call never starts a runtime inside another one. Any thread
/// may call in: plain threads, blocking-pool threads and async workers alike.
/// On a multi-thread runtime worker the wait goes through `block_in_place`.
pub(crate) struct Bridge {
    runtime: Option<Runtime>,
}

impl Bridge {
    pub(crate) fn new() -> Result<Self, DbError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("udbc-mysql")
            .enable_all()
            .build()
            .map_err(|e| DbError::General(format!("failed to start mysql runtime: {}", e)))?;
        Ok(Self {
            runtime: Some(runtime),
        })
    }

    fn handle(&self) -> Result<&Handle, DbError> {
        self.runtime
            .as_ref()
            .map(Runtime::handle)
            .ok_or_else(|| DbError::General("mysql runtime is shut down".to_string()))
    }

    /// Runs `fut` to completion on the bridge, blocking the calling thread.
    pub(crate) fn run<F>(&self, fut: F) -> Result<F::Output, DbError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        self.handle()?.spawn(async move {
            let _ = tx.send(fut.await);
        });
        let wait = move || {
            rx.recv()
                .map_err(|_| DbError::General("mysql task ended without a result".to_string()))
        };
        match Handle::try_current() {
            Ok(current) if current.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(wait)
            }
            _ => wait(),
        }
    }

    /// Enters the bridge's runtime context, e.g. to drop `mysql_async` values
    /// that spawn cleanup work.
    pub(crate) fn enter(&self) -> Option<EnterGuard<'_>> {
        self.runtime.as_ref().map(Runtime::enter)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        // dropping a runtime blocks, which is not allowed from async code
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_from_plain_thread() {
        let bridge = Bridge::new().unwrap();
        assert_eq!(bridge.run(async { 7 }).unwrap(), 7);
    }

    #[tokio::test]
    async fn test_run_inside_current_thread_runtime() {
        let bridge = Bridge::new().unwrap();
        let out = bridge
            .run(async {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                "done"
            })
            .unwrap();
        assert_eq!(out, "done");
        drop(bridge);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_inside_multi_thread_runtime() {
        let bridge = Bridge::new().unwrap();
        assert_eq!(bridge.run(async { 1 + 1 }).unwrap(), 2);
    }
}
