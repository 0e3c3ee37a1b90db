//! Shared harness for pool integration tests: a scriptable stand-in for a
//! database server.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mypool::{Driver, Endpoint, Error, PoolOptions, Result};

/// A [`Driver`] whose connections live in memory.
///
/// Cloning yields another handle to the same server state, so a test can hand
/// one clone to the pool and keep another to script it. Connections can be
/// killed server-side ([`TestDriver::kill`]) and upcoming connect attempts
/// can be made to fail ([`TestDriver::fail_next_connects`]), which is how the
/// broken-session paths of the pool are exercised. Counters track every open
/// and close, plus the peak number of simultaneously live connections.
#[derive(Clone, Default)]
pub struct TestDriver {
    state: Arc<ServerState>,
}

#[derive(Default)]
struct ServerState {
    fail_connects: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
    live: AtomicUsize,
    peak: AtomicUsize,
    conns: Mutex<Vec<Arc<AtomicBool>>>,
    endpoints: Mutex<Vec<Endpoint>>,
}

pub struct TestConn {
    alive: Arc<AtomicBool>,
    state: Arc<ServerState>,
}

impl Drop for TestConn {
    fn drop(&mut self) {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        self.state.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TestDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` connect attempts fail.
    pub fn fail_next_connects(&self, n: usize) {
        self.state.fail_connects.store(n, Ordering::SeqCst);
    }

    /// Total connections opened so far.
    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Total connections closed so far.
    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Connections currently open.
    pub fn live(&self) -> usize {
        self.state.live.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously open connections observed.
    pub fn peak_live(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }

    /// Kill the `index`-th connection (in open order) server-side: its pings
    /// start failing.
    pub fn kill(&self, index: usize) {
        self.state.conns.lock().unwrap()[index].store(false, Ordering::SeqCst);
    }

    /// Kill every connection opened so far.
    pub fn kill_all(&self) {
        for conn in self.state.conns.lock().unwrap().iter() {
            conn.store(false, Ordering::SeqCst);
        }
    }

    /// Endpoints passed to `connect`, in call order.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.state.endpoints.lock().unwrap().clone()
    }
}

impl Driver for TestDriver {
    type Conn = TestConn;
    type Row = String;

    fn connect(&self, endpoint: &Endpoint) -> Result<TestConn> {
        let state = &self.state;
        state.endpoints.lock().unwrap().push(endpoint.clone());

        let remaining = state.fail_connects.load(Ordering::SeqCst);
        if remaining > 0 {
            state.fail_connects.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::Driver("injected connect failure".into()));
        }

        let alive = Arc::new(AtomicBool::new(true));
        state.conns.lock().unwrap().push(Arc::clone(&alive));
        state.opened.fetch_add(1, Ordering::SeqCst);
        let live = state.live.fetch_add(1, Ordering::SeqCst) + 1;
        state.peak.fetch_max(live, Ordering::SeqCst);

        Ok(TestConn {
            alive,
            state: Arc::clone(state),
        })
    }

    fn ping(&self, conn: &mut TestConn) -> bool {
        conn.alive.load(Ordering::SeqCst)
    }

    fn execute(&self, conn: &mut TestConn, _sql: &str) -> Result<u64> {
        if conn.alive.load(Ordering::SeqCst) {
            Ok(1)
        } else {
            Err(Error::Driver("connection is dead".into()))
        }
    }

    fn query(&self, conn: &mut TestConn, sql: &str) -> Result<Vec<String>> {
        if conn.alive.load(Ordering::SeqCst) {
            Ok(vec![sql.to_owned()])
        } else {
            Err(Error::Driver("connection is dead".into()))
        }
    }
}

/// Pool options sized for tests, with a generous-but-finite acquire timeout.
pub fn options(init_size: u32, max_size: u32) -> PoolOptions {
    PoolOptions::new()
        .init_size(init_size)
        .max_size(max_size)
        .acquire_timeout(Duration::from_millis(500))
        .max_idle_time(Duration::from_secs(60))
}

/// Route `tracing` events to the test output.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
