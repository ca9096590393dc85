use std::sync::Arc;

use entwine_core::{EntError, Result, Rows, Statement, TxConn};
use parking_lot::Mutex;

use crate::client::{Client, Config, Executor};
use crate::entity::Entity;
use crate::query::Query;

/// Shared state of one driver transaction. Emptied on commit or rollback.
pub(crate) struct TxState {
    conn: Mutex<Option<Box<dyn TxConn>>>,
}

impl TxState {
    fn new(conn: Box<dyn TxConn>) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
        }
    }

    pub(crate) fn query(&self, stmt: &Statement) -> Result<Rows> {
        match self.conn.lock().as_mut() {
            Some(conn) => conn.query(stmt),
            None => Err(EntError::TxDone),
        }
    }

    pub(crate) fn exec(&self, stmt: &Statement) -> Result<usize> {
        match self.conn.lock().as_mut() {
            Some(conn) => conn.exec(stmt),
            None => Err(EntError::TxDone),
        }
    }

    fn take(&self) -> Result<Box<dyn TxConn>> {
        self.conn.lock().take().ok_or(EntError::TxDone)
    }

    fn is_done(&self) -> bool {
        self.conn.lock().is_none()
    }
}

/// A transaction started with [`Client::tx`].
///
/// Builders created from [`Tx::client`] run every statement, edge loads
/// included, on the transaction's connection. Once the transaction is
/// committed or rolled back those builders fail with [`EntError::TxDone`].
/// Dropping an unfinished transaction rolls it back.
pub struct Tx {
    state: Arc<TxState>,
    config: Config,
}

impl Tx {
    pub(crate) fn begin(config: Config) -> Result<Self> {
        let conn = config.driver().begin()?;
        Ok(Self {
            state: Arc::new(TxState::new(conn)),
            config,
        })
    }

    /// A client bound to this transaction.
    pub fn client(&self) -> Client {
        Client::bound(self.config.clone(), Executor::Tx(Arc::clone(&self.state)))
    }

    /// Shorthand for `self.client().query::<T>()`.
    pub fn query<T: Entity>(&self) -> Query<T> {
        self.client().query()
    }

    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    pub fn commit(self) -> Result<()> {
        self.state.take()?.commit()
    }

    pub fn rollback(self) -> Result<()> {
        self.state.take()?.rollback()
    }
}

impl Drop for Tx {
    fn drop(&mut self) {
        if let Ok(conn) = self.state.take() {
            let _ = conn.rollback();
        }
    }
}

impl std::fmt::Debug for Tx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tx")
            .field("done", &self.state.is_done())
            .finish_non_exhaustive()
    }
}
