use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use crate::{
    Error, PoolOptions, Result,
    driver::{Driver, Endpoint},
    session::Session,
};

/// Shared pool state.
///
/// Everything mutable lives in one mutex; one condition variable coordinates
/// the three kinds of waiter: consumers waiting for the idle queue to become
/// non-empty, the producer waiting for it to drain while there is still room
/// to grow, and the scavenger's shutdown-aware sleep.
pub(crate) struct PoolInner<D: Driver> {
    pub(super) options: PoolOptions,
    driver: Arc<D>,
    endpoint: Arc<Endpoint>,
    state: Mutex<PoolState<D>>,
    cond: Condvar,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

struct PoolState<D: Driver> {
    /// Sessions currently owned by the pool, served FIFO. Every entry was
    /// verified healthy, or freshly opened, since it last left a borrower.
    idle: VecDeque<Session<D>>,
    /// Sessions belonging to the pool: `idle` plus those lent out.
    total: u32,
    shutdown: bool,
}

impl<D: Driver> PoolInner<D> {
    /// Open the initial sessions and start the producer and scavenger.
    pub(super) fn new(options: PoolOptions, driver: D) -> Result<Arc<Self>> {
        let driver = Arc::new(driver);
        let endpoint = Arc::new(options.endpoint.clone());

        let mut idle = VecDeque::with_capacity(options.max_size as usize);
        for _ in 0..options.init_size {
            idle.push_back(Session::connect(Arc::clone(&driver), Arc::clone(&endpoint))?);
        }

        let inner = Arc::new(Self {
            state: Mutex::new(PoolState {
                total: options.init_size,
                idle,
                shutdown: false,
            }),
            cond: Condvar::new(),
            threads: Mutex::new(Vec::new()),
            driver,
            endpoint,
            options,
        });

        let producer = thread::Builder::new()
            .name("mypool-producer".into())
            .spawn({
                let inner = Arc::clone(&inner);
                move || run_producer(inner)
            })?;
        let scavenger = match thread::Builder::new().name("mypool-scavenger".into()).spawn({
            let inner = Arc::clone(&inner);
            move || run_scavenger(inner)
        }) {
            Ok(handle) => handle,
            Err(err) => {
                inner.state.lock().shutdown = true;
                inner.cond.notify_all();
                let _ = producer.join();
                return Err(err.into());
            }
        };
        *inner.threads.lock() = vec![producer, scavenger];

        tracing::info!(
            host = %inner.endpoint.host,
            port = inner.endpoint.port,
            database = %inner.endpoint.database,
            init_size = inner.options.init_size,
            max_size = inner.options.max_size,
            "connection pool started"
        );
        Ok(inner)
    }

    pub(super) fn size(&self) -> u32 {
        self.state.lock().total
    }

    pub(super) fn num_idle(&self) -> usize {
        self.state.lock().idle.len()
    }

    pub(super) fn is_closed(&self) -> bool {
        self.state.lock().shutdown
    }

    /// Borrow a session, waiting up to the configured acquire timeout.
    ///
    /// A session popped from the idle queue is probed with the lock released;
    /// a broken one is reopened in place, or dropped (making room for the
    /// producer) while we go back to waiting on the remaining time budget.
    pub(super) fn acquire(&self) -> Result<Session<D>> {
        let deadline = Instant::now() + self.options.acquire_timeout;

        loop {
            let mut session = {
                let mut state = self.state.lock();
                loop {
                    if state.shutdown {
                        return Err(Error::PoolClosed);
                    }
                    if let Some(session) = state.idle.pop_front() {
                        break session;
                    }
                    if self.cond.wait_until(&mut state, deadline).timed_out() {
                        if let Some(session) = state.idle.pop_front() {
                            break session;
                        }
                        if state.shutdown {
                            return Err(Error::PoolClosed);
                        }
                        tracing::warn!(
                            "timed out after {:?} waiting for an idle session",
                            self.options.acquire_timeout
                        );
                        return Err(Error::PoolTimedOut);
                    }
                }
            };
            // The queue may have just gone empty: wake the producer.
            self.cond.notify_all();

            if session.healthy() {
                return Ok(session);
            }
            match session.reopen() {
                Ok(()) => return Ok(session),
                Err(err) => {
                    tracing::warn!("dropping broken session after failed reopen: {err}");
                    drop(session);
                    let mut state = self.state.lock();
                    state.total -= 1;
                    self.cond.notify_all();
                    drop(state);
                    if Instant::now() >= deadline {
                        return Err(Error::PoolTimedOut);
                    }
                }
            }
        }
    }

    /// Non-blocking variant of [`acquire`](Self::acquire): takes an idle
    /// session if one is ready, reviving it if needed, and never waits.
    pub(super) fn try_acquire(&self) -> Option<Session<D>> {
        let mut session = {
            let mut state = self.state.lock();
            if state.shutdown {
                return None;
            }
            let session = state.idle.pop_front()?;
            self.cond.notify_all();
            session
        };

        if session.healthy() {
            return Some(session);
        }
        match session.reopen() {
            Ok(()) => Some(session),
            Err(err) => {
                tracing::warn!("dropping broken session after failed reopen: {err}");
                drop(session);
                let mut state = self.state.lock();
                state.total -= 1;
                self.cond.notify_all();
                None
            }
        }
    }

    /// Return a lent session to the idle queue, or drop it if it no longer
    /// probes healthy or the pool has shut down meanwhile.
    pub(super) fn release(&self, mut session: Session<D>) {
        let healthy = session.healthy();

        let mut state = self.state.lock();
        if state.shutdown || !healthy {
            state.total -= 1;
            self.cond.notify_all();
            drop(state);
            if !healthy {
                tracing::warn!("dropping unhealthy session on return to the pool");
            }
            return;
        }
        debug_assert!(state.idle.len() < state.total as usize);
        state.idle.push_back(session);
        self.cond.notify_all();
    }

    /// Destroy a lent session without returning it, releasing its slot.
    pub(super) fn discard(&self, session: Session<D>) {
        drop(session);
        let mut state = self.state.lock();
        state.total -= 1;
        self.cond.notify_all();
    }

    /// Shut the pool down: wake everyone, drain the idle queue, and join the
    /// background threads. Idempotent; outstanding borrows find `shutdown`
    /// set (or the pool gone) when they return.
    pub(super) fn shutdown(&self) {
        let drained = {
            let mut state = self.state.lock();
            if state.shutdown {
                Vec::new()
            } else {
                state.shutdown = true;
                self.cond.notify_all();
                let drained: Vec<Session<D>> = state.idle.drain(..).collect();
                state.total -= drained.len() as u32;
                drained
            }
        };
        // Close the drained sessions with the lock released.
        drop(drained);

        let threads = std::mem::take(&mut *self.threads.lock());
        for handle in threads {
            let _ = handle.join();
        }
    }
}

/// Demand-driven growth: manufacture a session only once the idle queue has
/// been observed empty with room left, never speculatively.
fn run_producer<D: Driver>(pool: Arc<PoolInner<D>>) {
    loop {
        {
            let mut state = pool.state.lock();
            while !state.shutdown
                && (!state.idle.is_empty() || state.total >= pool.options.max_size)
            {
                pool.cond.wait(&mut state);
            }
            if state.shutdown {
                return;
            }
        }

        match Session::connect(Arc::clone(&pool.driver), Arc::clone(&pool.endpoint)) {
            Ok(session) => {
                let mut state = pool.state.lock();
                if state.shutdown {
                    return;
                }
                state.idle.push_back(session);
                state.total += 1;
                debug_assert!(state.total <= pool.options.max_size);
                pool.cond.notify_all();
            }
            Err(err) => {
                tracing::warn!("failed to open a new session: {err}");
            }
        }
    }
}

/// Periodic sweep of the idle queue: revive or drop broken sessions, and trim
/// long-idle ones back toward the initial size. Probing happens under the
/// pool lock; only pool-owned idle sessions are ever touched.
fn run_scavenger<D: Driver>(pool: Arc<PoolInner<D>>) {
    loop {
        let mut state = pool.state.lock();
        let deadline = Instant::now() + pool.options.max_idle_time;
        while !state.shutdown {
            if pool.cond.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        if state.shutdown {
            return;
        }

        let mut kept = VecDeque::with_capacity(state.idle.len());
        while let Some(mut session) = state.idle.pop_front() {
            // A successful probe refreshes `last_active`, so staleness has to
            // be captured first.
            let stale = session.idle_for() >= pool.options.max_idle_time;
            if !session.healthy() {
                match session.reopen() {
                    Ok(()) => kept.push_back(session),
                    Err(err) => {
                        state.total -= 1;
                        tracing::warn!("dropping idle session after failed reopen: {err}");
                    }
                }
            } else if stale && state.total > pool.options.init_size {
                state.total -= 1;
                tracing::debug!(
                    "trimming session idle for {:?} back toward init_size",
                    pool.options.max_idle_time
                );
            } else {
                kept.push_back(session);
            }
        }
        state.idle = kept;

        if state.total < pool.options.init_size {
            pool.cond.notify_all();
        }
    }
}
