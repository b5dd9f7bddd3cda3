use crate::error::DbError;
use tracing::error;

/// Receives failures that must not interrupt the operation that hit them,
/// such as a connection that fails to close during member shutdown.
///
/// A sink is handed to the pool when it is built; there is no global handler.
pub trait ErrorSink: Send + Sync {
    fn on_error(&self, error: &DbError);
}

/// Default sink: logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn on_error(&self, err: &DbError) {
        error!("undeliverable error: {}", err);
    }
}

/// Sink backed by a closure.
pub struct FnSink<F> {
    f: F,
}

impl<F> FnSink<F>
where
    F: Fn(&DbError) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ErrorSink for FnSink<F>
where
    F: Fn(&DbError) + Send + Sync,
{
    fn on_error(&self, err: &DbError) {
        (self.f)(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_fn_sink_receives_error() {
        let seen = Mutex::new(Vec::new());
        let sink = FnSink::new(|e: &DbError| seen.lock().unwrap().push(e.to_string()));
        sink.on_error(&DbError::Connection("reset".into()));
        assert_eq!(*seen.lock().unwrap(), vec!["Connection error: reset".to_string()]);
    }

    #[test]
    fn test_tracing_sink_does_not_panic() {
        TracingSink.on_error(&DbError::General("boom".into()));
    }
}
