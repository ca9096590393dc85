//! Tracing utilities for query, transaction and edge-load observability.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site. The feature is checked in the crate that expands the
//! macro, so every crate using them declares its own `tracing` feature.

/// Emit a debug-level tracing event with the SQL text and argument count.
///
/// ```ignore
/// ent_trace_query!(&stmt.sql, stmt.args.len());
/// ```
#[macro_export]
macro_rules! ent_trace_query {
    ($sql:expr, $arg_count:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %$sql, args = $arg_count, "entwine.query");
    };
}

/// Emit an info-level tracing event for transaction lifecycle (begin, commit, rollback).
///
/// ```ignore
/// ent_trace_tx!("begin", "sqlite.rusqlite");
/// ```
#[macro_export]
macro_rules! ent_trace_tx {
    ($event:literal, $driver:expr) => {
        #[cfg(feature = "tracing")]
        tracing::info!(event = $event, driver = $driver, "entwine.transaction");
    };
}

/// Emit a debug-level tracing event after an edge has been stitched onto its parents.
#[macro_export]
macro_rules! ent_trace_edge {
    ($edge:expr, $parents:expr, $children:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            edge = $edge,
            parents = $parents,
            children = $children,
            "entwine.edge"
        );
    };
}
