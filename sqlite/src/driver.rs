use std::path::Path;
use std::sync::Arc;

use entwine_core::{Dialect, Driver, EntError, Result, Row, Rows, Statement, TxConn, Value};
use rusqlite::{Connection, params_from_iter};

use crate::connection::PoolOptions;
use crate::pool::Pool;
use crate::transaction::SqliteTx;

/// [`Driver`] over a pool of rusqlite connections.
///
/// Each statement checks a connection out for its own duration; transactions
/// keep theirs until commit or rollback. A thread holding a transaction on a
/// single-connection pool must route its queries through that transaction.
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    pool: Arc<Pool>,
    options: PoolOptions,
}

impl SqliteDriver {
    /// Opens `options.size` connections to the database file at `path`.
    pub fn open(path: impl AsRef<Path>, options: PoolOptions) -> Result<Self> {
        let path = path.as_ref();
        let connections = (0..options.size.max(1))
            .map(|_| Connection::open(path))
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(EntError::store)?;
        Self::from_connections(connections, options)
    }

    /// Opens a private in-memory database on a single connection.
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with(PoolOptions::default())
    }

    pub fn open_in_memory_with(options: PoolOptions) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(EntError::store)?;
        Self::from_connection(conn, options)
    }

    /// Wraps an already-open connection.
    pub fn from_connection(conn: Connection, options: PoolOptions) -> Result<Self> {
        Self::from_connections(vec![conn], options.size(1))
    }

    fn from_connections(connections: Vec<Connection>, options: PoolOptions) -> Result<Self> {
        for conn in &connections {
            options.configure(conn).map_err(EntError::store)?;
        }
        let pool = Pool::new(connections, options.checkout_timeout);
        Ok(Self { pool, options })
    }

    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// Runs `f` on a pooled connection, for schema setup and other work
    /// outside the query engine.
    pub fn with_connection<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<R>,
    {
        let conn = self.pool.checkout().map_err(EntError::store)?;
        f(&conn).map_err(EntError::store)
    }

    /// Executes semicolon-separated statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.with_connection(|conn| conn.execute_batch(sql))
    }
}

impl Driver for SqliteDriver {
    fn dialect(&self) -> Dialect {
        Dialect::SQLite
    }

    fn query(&self, stmt: &Statement) -> Result<Rows> {
        let conn = self.pool.checkout().map_err(EntError::store)?;
        query_rows(&conn, stmt)
    }

    fn exec(&self, stmt: &Statement) -> Result<usize> {
        let conn = self.pool.checkout().map_err(EntError::store)?;
        execute(&conn, stmt)
    }

    fn begin(&self) -> Result<Box<dyn TxConn>> {
        let conn = self.pool.checkout().map_err(EntError::store)?;
        let tx = SqliteTx::begin(conn, self.options.transaction_type)?;
        Ok(Box::new(tx))
    }

    fn name(&self) -> &'static str {
        "sqlite.rusqlite"
    }
}

/// Runs the query and returns all rows with their column names
pub(crate) fn query_rows(conn: &Connection, stmt: &Statement) -> Result<Rows> {
    let mut prepared = conn.prepare_cached(&stmt.sql).map_err(EntError::store)?;
    let columns: Vec<String> = prepared
        .column_names()
        .into_iter()
        .map(str::to_owned)
        .collect();
    let width = columns.len();

    let mut rows = prepared
        .query(params_from_iter(stmt.args.iter()))
        .map_err(EntError::store)?;

    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(EntError::store)? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            let value = row.get_ref(i).map_err(EntError::store)?;
            values.push(Value::from(value));
        }
        out.push(Row::new(values));
    }
    Ok(Rows::new(columns, out))
}

/// Runs the statement and returns the number of affected rows
pub(crate) fn execute(conn: &Connection, stmt: &Statement) -> Result<usize> {
    conn.execute(&stmt.sql, params_from_iter(stmt.args.iter()))
        .map_err(EntError::store)
}
