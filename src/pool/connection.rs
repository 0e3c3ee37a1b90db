use std::fmt::{self, Debug, Formatter};
use std::ops::{Deref, DerefMut};
use std::sync::Weak;

use crate::{driver::Driver, session::Session};

use super::inner::PoolInner;

/// A session borrowed from a [`Pool`][crate::Pool].
///
/// Will be returned to the pool on-drop: a session that still probes healthy
/// rejoins the idle queue, anything else is closed and its slot freed for the
/// producer. The back-reference to the pool is weak, so a connection that
/// outlives its pool simply closes its session.
pub struct PoolConnection<D: Driver> {
    session: Option<Session<D>>,
    pool: Weak<PoolInner<D>>,
}

const EXPECT_MSG: &str = "BUG: session already taken from the connection!";

impl<D: Driver> PoolConnection<D> {
    pub(super) fn new(session: Session<D>, pool: Weak<PoolInner<D>>) -> Self {
        Self {
            session: Some(session),
            pool,
        }
    }

    /// Close this connection's session without returning it to the pool,
    /// freeing the slot so the pool may open a replacement.
    ///
    /// Use this when the application has observed the session to be beyond
    /// recovery.
    pub fn close(mut self) {
        if let Some(session) = self.session.take() {
            match self.pool.upgrade() {
                Some(pool) => pool.discard(session),
                None => drop(session),
            }
        }
    }
}

impl<D: Driver> Deref for PoolConnection<D> {
    type Target = Session<D>;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref().expect(EXPECT_MSG)
    }
}

impl<D: Driver> DerefMut for PoolConnection<D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_mut().expect(EXPECT_MSG)
    }
}

impl<D: Driver> Debug for PoolConnection<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConnection")
            .field("session", &self.session)
            .finish()
    }
}

/// Returns the session to the [`Pool`][crate::Pool] it was borrowed from.
impl<D: Driver> Drop for PoolConnection<D> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            match self.pool.upgrade() {
                Some(pool) => pool.release(session),
                // The pool is gone; close the session locally.
                None => drop(session),
            }
        }
    }
}
