//! The store boundary.
//!
//! The engine renders [`Statement`]s and hands them to a [`Driver`]; drivers
//! turn them into [`Rows`]. Nothing here assumes a wire protocol.

use crate::dialect::Dialect;
use crate::error::Result;
use crate::row::Rows;
use crate::sql::Statement;

/// A shared, thread-safe handle to a relational store.
///
/// Implementations must allow concurrent calls from independent queries,
/// typically by checking a pooled connection out per statement.
pub trait Driver: Send + Sync {
    /// Dialect used to render statements for this store.
    fn dialect(&self) -> Dialect;

    /// Runs a statement that returns rows.
    fn query(&self, stmt: &Statement) -> Result<Rows>;

    /// Runs a statement and returns the number of affected rows.
    fn exec(&self, stmt: &Statement) -> Result<usize>;

    /// Starts a transaction pinned to one connection.
    fn begin(&self) -> Result<Box<dyn TxConn>>;

    /// Short name used in trace events.
    fn name(&self) -> &'static str {
        "driver"
    }
}

/// One open transaction, owned by a single caller.
pub trait TxConn: Send {
    fn query(&mut self, stmt: &Statement) -> Result<Rows>;

    fn exec(&mut self, stmt: &Statement) -> Result<usize>;

    fn commit(self: Box<Self>) -> Result<()>;

    fn rollback(self: Box<Self>) -> Result<()>;
}
