//! Provides the connection pool.
//!
//! Opening a MySQL session for each and every operation quickly becomes the
//! dominant cost of talking to the database. A connection pool keeps a
//! bounded set of pre-connected, validated sessions available for short-term
//! borrowing, growing on demand up to a hard ceiling and trimming itself back
//! when load subsides.
use std::fmt;
use std::sync::Arc;

use crate::{Result, driver::Driver};

use self::inner::PoolInner;

mod connection;
mod inner;

pub use self::connection::PoolConnection;

/// A pool of database sessions shared between threads.
///
/// Create a pool with [`PoolOptions`](crate::PoolOptions) and then call
/// [`Pool::acquire`] to borrow a session; when the returned
/// [`PoolConnection`] is dropped the session goes back to the pool so it can
/// be reused.
///
/// `init_size` sessions are opened synchronously at startup; the pool does
/// not start degraded, a failure there propagates out of
/// [`open`](crate::PoolOptions::open). After that the pool is demand-driven:
/// a background producer thread opens a new session only once the idle queue
/// has been observed empty, bounded by `max_size`, and a background scavenger
/// periodically revives or drops broken idle sessions and trims sessions
/// idle longer than `max_idle_time` back toward `init_size`.
///
/// Idle sessions are served FIFO to equalise per-session usage. `acquire`
/// never returns a session that failed its liveness probe at hand-off: a
/// broken session is reopened in place or replaced within the acquire
/// deadline.
///
/// `Pool` is `Send`, `Sync` and `Clone`. Cloning is cheap, it is a
/// reference-counted handle to the shared state. When the last clone is
/// dropped, or [`Pool::close`] is called, the pool shuts down: waiting
/// acquirers fail with [`Error::PoolClosed`](crate::Error::PoolClosed), the
/// background threads are joined, and idle sessions are closed. Sessions
/// still lent out are unaffected and are closed when their
/// [`PoolConnection`] is dropped.
pub struct Pool<D: Driver>(Arc<ShutdownGuard<D>>);

/// Shuts the inner pool down when the last user-facing clone goes away.
///
/// The background threads hold strong references to [`PoolInner`] while they
/// wait on its condition variable, so "last `Arc` dropped" cannot be the
/// shutdown trigger; this guard layer is what ties shutdown to the last
/// *user* handle instead.
struct ShutdownGuard<D: Driver> {
    inner: Arc<PoolInner<D>>,
}

impl<D: Driver> Drop for ShutdownGuard<D> {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

impl<D: Driver> Pool<D> {
    pub(crate) fn new(options: crate::PoolOptions, driver: D) -> Result<Self> {
        let inner = PoolInner::new(options, driver)?;
        Ok(Pool(Arc::new(ShutdownGuard { inner })))
    }

    /// Borrow a session from the pool.
    ///
    /// Waits up to the configured `acquire_timeout` for the idle queue to
    /// become non-empty, then returns the session at its front, verified
    /// healthy (or reopened) at hand-off. Fails with
    /// [`Error::PoolTimedOut`](crate::Error::PoolTimedOut) once the deadline
    /// elapses and with [`Error::PoolClosed`](crate::Error::PoolClosed) after
    /// shutdown.
    pub fn acquire(&self) -> Result<PoolConnection<D>> {
        let session = self.0.inner.acquire()?;
        Ok(PoolConnection::new(session, Arc::downgrade(&self.0.inner)))
    }

    /// Attempts to borrow a session from the pool without waiting.
    ///
    /// Returns `None` if no idle session is available right now.
    pub fn try_acquire(&self) -> Option<PoolConnection<D>> {
        let session = self.0.inner.try_acquire()?;
        Some(PoolConnection::new(session, Arc::downgrade(&self.0.inner)))
    }

    /// Shut down the pool, waking all threads waiting for a session.
    ///
    /// Currently waiting and subsequent calls to [`Pool::acquire`] return
    /// [`Error::PoolClosed`](crate::Error::PoolClosed), idle sessions are
    /// closed, and the background threads are joined before this returns.
    /// Borrowed sessions are unaffected, but will be closed on-drop rather
    /// than returned. Calling `close` more than once is harmless.
    pub fn close(&self) {
        self.0.inner.shutdown();
    }

    /// Returns `true` if [`close`][Pool::close] has been called on the pool,
    /// or the pool has otherwise shut down.
    pub fn is_closed(&self) -> bool {
        self.0.inner.is_closed()
    }

    /// Returns the number of sessions currently belonging to the pool,
    /// idle and borrowed alike.
    pub fn size(&self) -> u32 {
        self.0.inner.size()
    }

    /// Returns the number of idle sessions.
    pub fn num_idle(&self) -> usize {
        self.0.inner.num_idle()
    }
}

#[cfg(feature = "mysql")]
impl Pool<crate::MySqlDriver> {
    /// The lazily constructed process-wide pool, configured from
    /// [`DEFAULT_CONFIG_PATH`](crate::DEFAULT_CONFIG_PATH) in the working
    /// directory.
    ///
    /// A construction failure propagates to the caller and is retried on the
    /// next call. Independent pools can always be built directly through
    /// [`PoolOptions`](crate::PoolOptions); nothing in the design requires
    /// the singleton.
    pub fn instance() -> Result<&'static Self> {
        static INSTANCE: once_cell::sync::OnceCell<crate::MySqlPool> =
            once_cell::sync::OnceCell::new();

        INSTANCE.get_or_try_init(|| {
            crate::PoolOptions::load(crate::config::DEFAULT_CONFIG_PATH)?.open()
        })
    }
}

/// Returns a new [Pool] tied to the same shared state.
impl<D: Driver> Clone for Pool<D> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<D: Driver> fmt::Debug for Pool<D> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Pool")
            .field("size", &self.size())
            .field("num_idle", &self.num_idle())
            .field("is_closed", &self.is_closed())
            .field("options", &self.0.inner.options)
            .finish()
    }
}
