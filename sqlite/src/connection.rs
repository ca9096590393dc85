//! Connection settings and transaction types for the rusqlite driver

use std::time::Duration;

use rusqlite::Connection;

/// SQLite transaction types
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SQLiteTransactionType {
    #[default]
    /// A deferred transaction is the default - it does not acquire locks until needed
    Deferred,
    /// An immediate transaction acquires a RESERVED lock immediately
    Immediate,
    /// An exclusive transaction acquires an EXCLUSIVE lock immediately
    Exclusive,
}

impl SQLiteTransactionType {
    pub(crate) const fn begin_sql(self) -> &'static str {
        match self {
            SQLiteTransactionType::Deferred => "BEGIN DEFERRED",
            SQLiteTransactionType::Immediate => "BEGIN IMMEDIATE",
            SQLiteTransactionType::Exclusive => "BEGIN EXCLUSIVE",
        }
    }
}

impl From<SQLiteTransactionType> for ::rusqlite::TransactionBehavior {
    fn from(tx_type: SQLiteTransactionType) -> Self {
        match tx_type {
            SQLiteTransactionType::Deferred => ::rusqlite::TransactionBehavior::Deferred,
            SQLiteTransactionType::Immediate => ::rusqlite::TransactionBehavior::Immediate,
            SQLiteTransactionType::Exclusive => ::rusqlite::TransactionBehavior::Exclusive,
        }
    }
}

impl From<::rusqlite::TransactionBehavior> for SQLiteTransactionType {
    fn from(behavior: ::rusqlite::TransactionBehavior) -> Self {
        match behavior {
            ::rusqlite::TransactionBehavior::Deferred => SQLiteTransactionType::Deferred,
            ::rusqlite::TransactionBehavior::Immediate => SQLiteTransactionType::Immediate,
            ::rusqlite::TransactionBehavior::Exclusive => SQLiteTransactionType::Exclusive,
            _ => SQLiteTransactionType::Deferred, // Default for any future variants
        }
    }
}

/// Settings applied when the driver opens its connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Number of connections kept open. In-memory databases always use one.
    pub size: usize,
    /// How long SQLite retries a locked database before failing a statement.
    pub busy_timeout: Duration,
    /// How long a caller waits for a free pooled connection.
    pub checkout_timeout: Duration,
    /// Runs `PRAGMA foreign_keys = ON` on every connection.
    pub foreign_keys: bool,
    /// Lock mode used by [`entwine_core::Driver::begin`].
    pub transaction_type: SQLiteTransactionType,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            size: 4,
            busy_timeout: Duration::from_secs(5),
            checkout_timeout: Duration::from_secs(30),
            foreign_keys: true,
            transaction_type: SQLiteTransactionType::Deferred,
        }
    }
}

impl PoolOptions {
    pub fn size(mut self, size: usize) -> Self {
        self.size = size.max(1);
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = timeout;
        self
    }

    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn transaction_type(mut self, tx_type: SQLiteTransactionType) -> Self {
        self.transaction_type = tx_type;
        self
    }

    pub(crate) fn configure(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.busy_timeout(self.busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", self.foreign_keys)?;
        Ok(())
    }
}
