//! # entwine
//!
//! Typed graph-entity queries over relational stores, with batched eager
//! loading of edges.
//!
//! ## Quick Start
//!
//! ```rust
//! use entwine::prelude::*;
//! use entwine::sqlite::SqliteDriver;
//!
//! static SERVICE: EntitySchema = EntitySchema {
//!     label: "service",
//!     table: "services",
//!     id_column: "id",
//!     columns: &[ColumnSpec::new("id"), ColumnSpec::new("name")],
//!     foreign_keys: &[],
//!     edges: &[],
//! };
//!
//! #[derive(Debug, Clone)]
//! struct Service {
//!     id: String,
//!     name: String,
//!     edges: Edges,
//! }
//!
//! impl Entity for Service {
//!     const SCHEMA: &'static EntitySchema = &SERVICE;
//!
//!     fn from_row(row: &mut RowReader<'_>) -> Result<Self> {
//!         Ok(Self { id: row.id()?, name: row.next()?, edges: Edges::default() })
//!     }
//!
//!     fn id(&self) -> &str { &self.id }
//!     fn edges(&self) -> &Edges { &self.edges }
//!     fn edges_mut(&mut self) -> &mut Edges { &mut self.edges }
//! }
//!
//! # fn main() -> entwine::Result<()> {
//! let driver = SqliteDriver::open_in_memory()?;
//! driver.execute_batch(
//!     "CREATE TABLE services (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
//!      INSERT INTO services (name) VALUES ('vpn'), ('fiber');",
//! )?;
//! let client = Client::new(driver);
//!
//! let vpn = client
//!     .query::<Service>()
//!     .r#where(predicate::eq("name", "vpn"))
//!     .only()?;
//! assert_eq!(vpn.id(), "1");
//! assert_eq!(client.query::<Service>().count()?, 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Drivers
//!
//! | Store  | Driver   | Feature Flag | Status |
//! |--------|----------|--------------|--------|
//! | SQLite | rusqlite | `sqlite`     | ✅     |
//!
//! PostgreSQL and MySQL statements can be rendered through [`Dialect`] but
//! have no driver.

mod client;
mod entity;
mod query;
mod transaction;

pub mod must;

// =============================================================================
// Root-level exports
// =============================================================================

pub use client::{Client, Config};
pub use entity::{Edges, Entity};
pub use query::{GroupBy, Query, Select};
pub use transaction::Tx;

/// Result type for entwine operations
pub use entwine_core::error::Result;

/// Dialect a statement is rendered for
pub use entwine_core::Dialect;

/// Error types
pub mod error {
    pub use entwine_core::error::{BoxError, EntError};
}

pub use entwine_core::EntError;

/// Statement rendering, schema metadata, values and rows.
pub use entwine_core as core;

/// Filters, sort terms and aggregates.
///
/// ```rust,ignore
/// use entwine::predicate::{self, and, eq, has_edge, desc};
/// ```
pub mod predicate {
    pub use entwine_core::predicate::*;
}

/// The rusqlite-backed driver.
#[cfg(feature = "sqlite")]
pub mod sqlite {
    pub use entwine_sqlite::*;

    /// Re-exported so callers can match the driver's rusqlite version.
    pub use rusqlite;
}

pub mod prelude {
    pub use crate::must::{Must, QueryX};
    pub use crate::predicate;
    pub use crate::{Client, Config, Edges, Entity, Query, Tx};
    pub use entwine_core::{
        Aggregate, ColumnSpec, Dialect, EdgeDescriptor, EntError, EntitySchema, Order,
        Predicate, Result, RowReader,
    };
}
