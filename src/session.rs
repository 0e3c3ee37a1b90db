use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{
    Error, Result,
    driver::{Driver, Endpoint},
};

/// One live logical connection to the MySQL server.
///
/// A session is owned by exactly one holder at a time: the idle queue inside
/// the pool, or the [`PoolConnection`](crate::PoolConnection) it was lent
/// through. It carries its endpoint so that [`reopen`](Session::reopen) needs
/// no arguments, and a `last_active` timestamp the scavenger uses to decide
/// which sessions have gone stale.
pub struct Session<D: Driver> {
    driver: Arc<D>,
    endpoint: Arc<Endpoint>,
    conn: Option<D::Conn>,
    last_active: Instant,
}

impl<D: Driver> Session<D> {
    /// Open a new session against `endpoint`.
    pub(crate) fn connect(driver: Arc<D>, endpoint: Arc<Endpoint>) -> Result<Self> {
        let conn = driver.connect(&endpoint)?;
        Ok(Self {
            driver,
            endpoint,
            conn: Some(conn),
            last_active: Instant::now(),
        })
    }

    /// Close the underlying connection (ignoring errors) and re-establish it
    /// with the endpoint captured at open time.
    pub fn reopen(&mut self) -> Result<()> {
        self.conn = None;
        self.conn = Some(self.driver.connect(&self.endpoint)?);
        self.last_active = Instant::now();
        Ok(())
    }

    /// Probe the server for liveness.
    ///
    /// Refreshes `last_active` on success. A closed session is never healthy.
    pub fn healthy(&mut self) -> bool {
        let Some(conn) = self.conn.as_mut() else {
            return false;
        };
        let alive = self.driver.ping(conn);
        if alive {
            self.last_active = Instant::now();
        }
        alive
    }

    /// Time elapsed since this session was last used or probed successfully.
    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }

    /// Mark the session as used right now.
    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    /// Execute a statement, returning the number of affected rows.
    pub fn execute(&mut self, sql: &str) -> Result<u64> {
        let Some(conn) = self.conn.as_mut() else {
            return Err(Error::driver("session is not open"));
        };
        let affected = self.driver.execute(conn, sql)?;
        self.last_active = Instant::now();
        Ok(affected)
    }

    /// Run a query and collect its rows.
    pub fn query(&mut self, sql: &str) -> Result<Vec<D::Row>> {
        let Some(conn) = self.conn.as_mut() else {
            return Err(Error::driver("session is not open"));
        };
        let rows = self.driver.query(conn, sql)?;
        self.last_active = Instant::now();
        Ok(rows)
    }

    /// Drop the underlying connection, leaving the session closed.
    pub fn close(&mut self) {
        self.conn = None;
    }
}

impl<D: Driver> Debug for Session<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("open", &self.conn.is_some())
            .field("idle_for", &self.idle_for())
            .finish()
    }
}
