use std::path::Path;
use std::time::Duration;

use crate::{
    Config, Error, Result,
    driver::{Driver, Endpoint},
    pool::Pool,
};

/// Configure a connection pool.
///
/// The defaults match the documented configuration-file defaults; use
/// [`PoolOptions::load`] to read them from a `db_config.ini`-style file, or
/// the builder methods to set them directly:
///
/// ```no_run
/// use std::time::Duration;
/// use mypool::PoolOptions;
///
/// # fn main() -> mypool::Result<()> {
/// let pool = PoolOptions::new()
///     .host("db.internal")
///     .username("app")
///     .password("secret")
///     .database("appdb")
///     .init_size(2)
///     .max_size(8)
///     .acquire_timeout(Duration::from_millis(250))
///     .open()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PoolOptions {
    pub(crate) endpoint: Endpoint,
    pub(crate) init_size: u32,
    pub(crate) max_size: u32,
    pub(crate) max_idle_time: Duration,
    pub(crate) acquire_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolOptions {
    /// Construct `Self` with default options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoint: Endpoint::default(),
            init_size: 5,
            max_size: 10,
            max_idle_time: Duration::from_secs(60),
            acquire_timeout: Duration::from_millis(100),
        }
    }

    /// Read options from a loaded [`Config`], falling back to the defaults
    /// for keys that are absent or malformed.
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::new();
        Self {
            endpoint: Endpoint {
                host: config.get_string("ip", &defaults.endpoint.host),
                port: u16::try_from(config.get_int("port", defaults.endpoint.port.into()))
                    .unwrap_or(defaults.endpoint.port),
                username: config.get_string("username", &defaults.endpoint.username),
                password: config.get_string("password", &defaults.endpoint.password),
                database: config.get_string("dbname", &defaults.endpoint.database),
            },
            init_size: u32::try_from(config.get_int("initSize", defaults.init_size.into()))
                .unwrap_or(defaults.init_size),
            max_size: u32::try_from(config.get_int("maxSize", defaults.max_size.into()))
                .unwrap_or(defaults.max_size),
            max_idle_time: Duration::from_secs(
                u64::try_from(config.get_int(
                    "maxIdleTime",
                    defaults.max_idle_time.as_secs() as i64,
                ))
                .unwrap_or(defaults.max_idle_time.as_secs()),
            ),
            acquire_timeout: Duration::from_millis(
                u64::try_from(config.get_int(
                    "connectionTimeOut",
                    defaults.acquire_timeout.as_millis() as i64,
                ))
                .unwrap_or(defaults.acquire_timeout.as_millis() as u64),
            ),
        }
    }

    /// Load options from a configuration file, selecting the parser by
    /// extension (`.ini`, `.yaml`, `.yml`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Config::load(path).map_err(|err| {
            tracing::error!("failed to load pool configuration from {}: {err}", path.display());
            err
        })?;
        tracing::info!("loaded pool configuration from {}", path.display());
        Ok(Self::from_config(&config))
    }

    /// Set the MySQL host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.endpoint.host = host.into();
        self
    }

    /// Set the MySQL port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.endpoint.port = port;
        self
    }

    /// Set the user to authenticate as.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.endpoint.username = username.into();
        self
    }

    /// Set the password to authenticate with.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.endpoint.password = password.into();
        self
    }

    /// Set the initial database.
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.endpoint.database = database.into();
        self
    }

    /// Set the whole endpoint at once.
    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Number of sessions opened eagerly at startup, and the floor the
    /// scavenger trims back toward.
    #[must_use]
    pub fn init_size(mut self, init_size: u32) -> Self {
        self.init_size = init_size;
        self
    }

    /// Hard ceiling on the number of sessions belonging to the pool.
    #[must_use]
    pub fn max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// How long a session may sit idle before the scavenger trims it; also
    /// the scavenger's wake-up period.
    #[must_use]
    pub fn max_idle_time(mut self, max_idle_time: Duration) -> Self {
        self.max_idle_time = max_idle_time;
        self
    }

    /// Deadline for [`Pool::acquire`](crate::Pool::acquire).
    #[must_use]
    pub fn acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.acquire_timeout = acquire_timeout;
        self
    }

    /// Open a pool backed by the given driver.
    ///
    /// Opens `init_size` sessions synchronously before returning; any failure
    /// there is fatal and the pool does not start.
    pub fn open_with<D: Driver>(self, driver: D) -> Result<Pool<D>> {
        if self.max_size == 0 {
            return Err(Error::Config("maxSize must be at least 1".into()));
        }
        if self.init_size > self.max_size {
            return Err(Error::Config(format!(
                "initSize ({}) must not exceed maxSize ({})",
                self.init_size, self.max_size
            )));
        }
        Pool::new(self, driver)
    }

    /// Open a MySQL-backed pool.
    #[cfg(feature = "mysql")]
    pub fn open(self) -> Result<Pool<crate::MySqlDriver>> {
        self.open_with(crate::MySqlDriver)
    }
}
