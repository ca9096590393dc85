//! SQLite driver for `entwine`, built on [`rusqlite`].
//!
//! ```
//! use entwine_core::{Driver, Statement};
//! use entwine_sqlite::SqliteDriver;
//!
//! let driver = SqliteDriver::open_in_memory()?;
//! driver.execute_batch("CREATE TABLE services (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")?;
//! let rows = driver.query(&Statement {
//!     sql: "SELECT id, name FROM services".into(),
//!     args: vec![],
//! })?;
//! assert!(rows.is_empty());
//! # Ok::<(), entwine_core::EntError>(())
//! ```

mod connection;
mod driver;
mod pool;
mod transaction;

pub use connection::{PoolOptions, SQLiteTransactionType};
pub use driver::SqliteDriver;
pub use pool::PoolError;
pub use transaction::SqliteTx;
