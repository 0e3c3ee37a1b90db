//! Types for working with errors produced by mypool.

use std::io;

/// A specialized `Result` type for mypool.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error source produced by a database driver.
pub(crate) type BoxDynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Represents all the ways a method can fail within mypool.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The pool configuration could not be loaded, or holds invalid values.
    ///
    /// Configuration failures are fatal: the pool refuses to start rather
    /// than start degraded or guess at a file format.
    #[error("invalid pool configuration: {0}")]
    Config(String),

    /// Error reading the configuration file or spawning a pool thread.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Error returned from the database driver.
    #[error("error communicating with database: {0}")]
    Driver(#[source] BoxDynError),

    /// A [`Pool::acquire`] timed out due to connections not becoming available
    /// before the configured deadline.
    ///
    /// [`Pool::acquire`]: crate::Pool::acquire
    #[error("pool timed out while waiting for an open connection")]
    PoolTimedOut,

    /// [`Pool::close`] was called, or the pool was dropped, while we were
    /// waiting in [`Pool::acquire`].
    ///
    /// [`Pool::acquire`]: crate::Pool::acquire
    /// [`Pool::close`]: crate::Pool::close
    #[error("attempted to acquire a connection on a closed pool")]
    PoolClosed,
}

impl Error {
    pub(crate) fn driver(err: impl Into<BoxDynError>) -> Self {
        Error::Driver(err.into())
    }
}
