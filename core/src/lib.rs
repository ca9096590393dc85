//! Statement rendering, predicate algebra and row decoding shared by the
//! `entwine` query engine and its drivers.

pub mod dialect;
pub mod driver;
pub mod error;
pub mod predicate;
pub mod row;
pub mod schema;
pub mod sql;
pub mod tracing;
pub mod value;

// Re-export key types and traits
pub use dialect::Dialect;
pub use driver::{Driver, TxConn};
pub use error::{BoxError, EntError, Result};
pub use predicate::{Aggregate, Order, Predicate};
pub use row::{FromRow, FromValue, Row, RowReader, Rows, decode_id, format_id, parse_id};
pub use schema::{Cardinality, ColumnSpec, EdgeDescriptor, EntitySchema, Join};
pub use sql::{Direction, SQL, SQLChunk, Selector, Statement, Token};
pub use value::Value;
