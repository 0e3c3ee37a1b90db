//! A synchronous MySQL connection pool focusing on correctness and
//! predictable resource usage.
//!
//! Sessions are borrowed with [`Pool::acquire`] and returned automatically
//! when the [`PoolConnection`] goes out of scope. The pool grows on demand up
//! to a hard ceiling and trims itself back toward its initial size when load
//! subsides; see the [`pool`](crate::Pool) documentation for the full
//! lifecycle.

/// Typed key/value view over the configuration file.
mod config;
/// Connection driver abstraction.
mod driver;
/// Error types and result helpers.
pub mod error;
/// MySQL driver backend.
#[cfg(feature = "mysql")]
mod mysql;
/// Pool configuration builder.
mod options;
/// Connection pool implementation.
mod pool;
/// A single database session.
mod session;

pub use crate::{
    config::{Config, DEFAULT_CONFIG_PATH},
    driver::{Driver, Endpoint},
    error::{Error, Result},
    options::PoolOptions,
    pool::{Pool, PoolConnection},
    session::Session,
};

#[cfg(feature = "mysql")]
pub use crate::mysql::{MySqlDriver, MySqlPool};
