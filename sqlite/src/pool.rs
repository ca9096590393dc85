//! A fixed-size pool of rusqlite connections.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("timed out after {0:?} waiting for a pooled connection")]
    Timeout(Duration),
}

/// Idle connections plus a condition variable signalled on every return.
#[derive(Debug)]
pub(crate) struct Pool {
    idle: Mutex<Vec<Connection>>,
    returned: Condvar,
    checkout_timeout: Duration,
}

impl Pool {
    pub(crate) fn new(connections: Vec<Connection>, checkout_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            idle: Mutex::new(connections),
            returned: Condvar::new(),
            checkout_timeout,
        })
    }

    /// Takes an idle connection, blocking until one is returned.
    pub(crate) fn checkout(self: &Arc<Self>) -> Result<PooledConnection, PoolError> {
        let deadline = Instant::now() + self.checkout_timeout;
        let mut idle = self.idle.lock();
        loop {
            if let Some(conn) = idle.pop() {
                return Ok(PooledConnection {
                    pool: Arc::clone(self),
                    conn: Some(conn),
                });
            }
            if self.returned.wait_until(&mut idle, deadline).timed_out() && idle.is_empty() {
                return Err(PoolError::Timeout(self.checkout_timeout));
            }
        }
    }

    fn put_back(&self, conn: Connection) {
        self.idle.lock().push(conn);
        self.returned.notify_one();
    }
}

/// A connection checked out of the pool; returned on drop.
#[derive(Debug)]
pub(crate) struct PooledConnection {
    pool: Arc<Pool>,
    conn: Option<Connection>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only `Drop` takes the connection out.
        match &self.conn {
            Some(conn) => conn,
            None => unreachable!("pooled connection used after release"),
        }
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        match &mut self.conn {
            Some(conn) => conn,
            None => unreachable!("pooled connection used after release"),
        }
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.put_back(conn);
        }
    }
}
