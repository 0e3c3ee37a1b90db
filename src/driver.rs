use std::fmt::{self, Debug, Formatter};

use crate::Result;

/// The server coordinates of a pool, captured once at startup.
///
/// Every session the pool opens, and every reopen of a broken session, uses
/// the same endpoint; there is no failover between hosts.
#[derive(Clone)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 3306,
            username: "root".into(),
            password: String::new(),
            database: "test".into(),
        }
    }
}

impl Debug for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Opens and operates raw database connections on behalf of the pool.
///
/// The pool itself only needs to open a connection, probe its liveness, and
/// pass statements through; everything else about the client protocol lives
/// behind this trait. The [`MySqlDriver`](crate::MySqlDriver) backend covers
/// production use, while tests inject drivers with scriptable failures.
pub trait Driver: Send + Sync + 'static {
    /// Raw connection type produced by this driver.
    type Conn: Send + 'static;

    /// Row type returned by [`query`](Driver::query).
    type Row: Send + 'static;

    /// Open a new connection to `endpoint`.
    fn connect(&self, endpoint: &Endpoint) -> Result<Self::Conn>;

    /// Cheap server-side liveness probe.
    ///
    /// Must not otherwise mutate the connection.
    fn ping(&self, conn: &mut Self::Conn) -> bool;

    /// Execute a statement, returning the number of affected rows.
    fn execute(&self, conn: &mut Self::Conn, sql: &str) -> Result<u64>;

    /// Run a query and collect its rows.
    fn query(&self, conn: &mut Self::Conn, sql: &str) -> Result<Vec<Self::Row>>;
}
