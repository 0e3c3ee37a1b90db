use ::mysql::prelude::Queryable;

use crate::{
    Error, Result,
    driver::{Driver, Endpoint},
    pool::Pool,
};

/// A pool of MySQL sessions.
pub type MySqlPool = Pool<MySqlDriver>;

/// [`Driver`] backend over the `mysql` crate.
pub struct MySqlDriver;

impl Driver for MySqlDriver {
    type Conn = ::mysql::Conn;
    type Row = ::mysql::Row;

    fn connect(&self, endpoint: &Endpoint) -> Result<Self::Conn> {
        let opts = ::mysql::OptsBuilder::new()
            .ip_or_hostname(Some(endpoint.host.clone()))
            .tcp_port(endpoint.port)
            .user(Some(endpoint.username.clone()))
            .pass(Some(endpoint.password.clone()))
            .db_name(Some(endpoint.database.clone()));
        ::mysql::Conn::new(opts).map_err(Error::driver)
    }

    fn ping(&self, conn: &mut Self::Conn) -> bool {
        conn.query_drop("SELECT 1").is_ok()
    }

    fn execute(&self, conn: &mut Self::Conn, sql: &str) -> Result<u64> {
        conn.query_drop(sql).map_err(Error::driver)?;
        Ok(conn.affected_rows())
    }

    fn query(&self, conn: &mut Self::Conn, sql: &str) -> Result<Vec<Self::Row>> {
        conn.query(sql).map_err(Error::driver)
    }
}
