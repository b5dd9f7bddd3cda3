use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use udbc_pool::sink::FnSink;
use udbc_pool::udbc::{Connection, FnSource};
use udbc_pool::{BlockingPool, DbError, Member, Pool};

#[derive(Debug)]
struct TestConn {
    name: &'static str,
    closes: AtomicUsize,
}

impl Connection for TestConn {
    fn close(&self) -> Result<(), DbError> {
        if self.closes.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(DbError::Connection(format!("{} is closed", self.name)));
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closes.load(Ordering::SeqCst) > 0
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_first_acquire_wins_then_checkin_and_shutdown() {
    let acquires = Arc::new(AtomicUsize::new(0));
    let counter = acquires.clone();
    let source = FnSource::new(move || {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            thread::sleep(Duration::from_millis(30));
            Ok(TestConn {
                name: "C1",
                closes: AtomicUsize::new(0),
            })
        } else {
            Err(DbError::Connection("no more connections".into()))
        }
    });

    let sunk = Arc::new(Mutex::new(Vec::new()));
    let sink_log = sunk.clone();
    let pool = BlockingPool::builder(source)
        .error_sink(FnSink::new(move |e: &DbError| {
            sink_log.lock().unwrap().push(e.to_string())
        }))
        .build();

    let member = pool.member().await.unwrap();
    assert_eq!(acquires.load(Ordering::SeqCst), 0);

    let barrier = Barrier::new(2);
    let (a, b) = thread::scope(|s| {
        let ha = s.spawn(|| {
            barrier.wait();
            member.connection().unwrap()
        });
        let hb = s.spawn(|| {
            barrier.wait();
            member.connection().unwrap()
        });
        (ha.join().unwrap(), hb.join().unwrap())
    });
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.name, "C1");
    assert_eq!(acquires.load(Ordering::SeqCst), 1);

    member.checkout().checkin().unwrap();
    assert_eq!(a.closes.load(Ordering::SeqCst), 1);
    assert!(a.is_closed());

    member.shutdown();
    assert!(member.is_shutdown());
    assert_eq!(acquires.load(Ordering::SeqCst), 1);
    // checkin already closed C1, so shutdown leaves it alone
    assert_eq!(a.closes.load(Ordering::SeqCst), 1);
    assert!(sunk.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_async_materialize_failure_is_shared() {
    let source = FnSource::new(|| -> Result<TestConn, DbError> {
        Err(DbError::Connection("refused".into()))
    });
    let pool = BlockingPool::new(source);
    let member = pool.member().await.unwrap();

    let first = member.connection_async().await.unwrap_err();
    let second = member.connection_async().await.unwrap_err();
    match (first, second) {
        (DbError::Acquire(a), DbError::Acquire(b)) => assert!(Arc::ptr_eq(&a, &b)),
        other => panic!("unexpected errors: {:?}", other),
    }
    assert!(member.value().is_none());
    member.checkin().unwrap();
    member.shutdown();
    assert!(member.is_shutdown());
}

#[tokio::test]
async fn test_pool_close_with_closure_source() {
    let pool = BlockingPool::new(FnSource::new(|| {
        Ok::<_, DbError>(TestConn {
            name: "C",
            closes: AtomicUsize::new(0),
        })
    }));
    pool.close().await.unwrap();
}
