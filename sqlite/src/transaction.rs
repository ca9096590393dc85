use entwine_core::{EntError, Result, Rows, Statement, TxConn};

use crate::connection::SQLiteTransactionType;
use crate::driver::{execute, query_rows};
use crate::pool::PooledConnection;

/// An open transaction holding its pooled connection until it finishes.
///
/// Dropping an unfinished transaction rolls it back before the connection
/// goes back to the pool.
#[derive(Debug)]
pub struct SqliteTx {
    conn: PooledConnection,
    tx_type: SQLiteTransactionType,
    finished: bool,
}

impl SqliteTx {
    pub(crate) fn begin(conn: PooledConnection, tx_type: SQLiteTransactionType) -> Result<Self> {
        conn.execute_batch(tx_type.begin_sql())
            .map_err(EntError::store)?;
        entwine_core::ent_trace_tx!("begin", "sqlite.rusqlite");
        Ok(Self {
            conn,
            tx_type,
            finished: false,
        })
    }

    /// Gets the transaction type
    #[inline]
    pub fn tx_type(&self) -> SQLiteTransactionType {
        self.tx_type
    }

    fn finish(&mut self, sql: &str) -> Result<()> {
        self.finished = true;
        self.conn.execute_batch(sql).map_err(EntError::store)
    }
}

impl TxConn for SqliteTx {
    fn query(&mut self, stmt: &Statement) -> Result<Rows> {
        query_rows(&self.conn, stmt)
    }

    fn exec(&mut self, stmt: &Statement) -> Result<usize> {
        execute(&self.conn, stmt)
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        let result = self.finish("COMMIT");
        if result.is_err() && !self.conn.is_autocommit() {
            // COMMIT can fail with the transaction still open (SQLITE_BUSY).
            let _ = self.conn.execute_batch("ROLLBACK");
        }
        entwine_core::ent_trace_tx!("commit", "sqlite.rusqlite");
        result
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        let result = self.finish("ROLLBACK");
        entwine_core::ent_trace_tx!("rollback", "sqlite.rusqlite");
        result
    }
}

impl Drop for SqliteTx {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.conn.execute_batch("ROLLBACK");
            entwine_core::ent_trace_tx!("rollback", "sqlite.rusqlite");
        }
    }
}
