//! Reduced views: group-by with aggregates, and field projections.
//!
//! Both honor the parent query's filters, ordering and pagination and never
//! load edges. Results are scanned positionally into any [`FromRow`] shape
//! whose width matches the selected columns.

use entwine_core::predicate::{self, Aggregate};
use entwine_core::{EntError, FromRow, Result, Rows, Selector, Statement, decode_id};

use super::Query;
use crate::entity::Entity;

/// `GROUP BY` over fields of `T` with aggregate columns.
#[derive(Debug, Clone)]
pub struct GroupBy<T: Entity> {
    query: Query<T>,
    fields: Vec<&'static str>,
    aggregates: Vec<Aggregate>,
}

impl<T: Entity> GroupBy<T> {
    pub(crate) fn new(query: Query<T>, fields: Vec<&'static str>) -> Self {
        Self {
            query,
            fields,
            aggregates: Vec::new(),
        }
    }

    /// Adds an aggregate column after the grouped fields.
    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregates.push(aggregate);
        self
    }

    fn selector(&self) -> Selector {
        let schema = T::SCHEMA;
        let mut s = self.query.selector();
        let mut columns = Vec::with_capacity(self.fields.len() + self.aggregates.len());
        for &name in &self.fields {
            let column = predicate::field(schema, &mut s, name);
            s.group_by(column.clone());
            columns.push(column);
        }
        for aggregate in &self.aggregates {
            columns.push(aggregate.to_sql(schema, &mut s));
        }
        s.select(columns);
        s
    }
}

/// Projection of fields of `T`; `DISTINCT` when the query is unique.
#[derive(Debug, Clone)]
pub struct Select<T: Entity> {
    query: Query<T>,
    fields: Vec<&'static str>,
}

impl<T: Entity> Select<T> {
    pub(crate) fn new(query: Query<T>, fields: Vec<&'static str>) -> Self {
        Self { query, fields }
    }

    fn selector(&self) -> Selector {
        let schema = T::SCHEMA;
        let mut s = self.query.selector();
        let columns: Vec<_> = self
            .fields
            .iter()
            .map(|&name| predicate::field(schema, &mut s, name))
            .collect();
        s.select(columns);
        s
    }
}

macro_rules! impl_scan {
    ($($view:ident),+) => { $(
        impl<T: Entity> $view<T> {
            /// The rendered statement.
            pub fn statement(&self) -> Result<Statement> {
                self.selector().build()
            }

            /// Raw rows in store order.
            pub fn rows(&self) -> Result<Rows> {
                self.query.client().query_raw(&self.statement()?)
            }

            /// Decodes every row into `R`. The width of `R` must equal the
            /// number of selected columns.
            pub fn scan<R: FromRow>(&self) -> Result<Vec<R>> {
                let rows = self.rows_of_width(R::WIDTH)?;
                rows.into_iter().map(|row| R::from_row(&row)).collect()
            }

            /// Single text column. Identifier and foreign-key columns come
            /// back in their canonical string form.
            pub fn strings(&self) -> Result<Vec<String>> {
                if !self.fields.first().is_some_and(|&name| T::SCHEMA.is_key(name)) {
                    return self.scan();
                }
                let rows = self.rows_of_width(1)?;
                rows.into_iter()
                    .map(|row| match row.get(0) {
                        Some(value) => decode_id(value)
                            .map_err(|err| EntError::mismatch(format!("column 0: {err}"))),
                        None => Err(EntError::mismatch("empty row")),
                    })
                    .collect()
            }

            fn rows_of_width(&self, width: usize) -> Result<Rows> {
                let s = self.selector();
                if width != s.column_count() {
                    return Err(EntError::invalid(format!(
                        "ambiguous shape: {} columns selected, target reads {}",
                        s.column_count(),
                        width
                    )));
                }
                self.query.client().query_raw(&s.build()?)
            }

            /// Single integer column.
            pub fn ints(&self) -> Result<Vec<i64>> {
                self.scan()
            }

            /// Single floating-point column.
            pub fn float64s(&self) -> Result<Vec<f64>> {
                self.scan()
            }

            /// Single boolean column.
            pub fn bools(&self) -> Result<Vec<bool>> {
                self.scan()
            }
        }
    )+ };
}

impl_scan!(GroupBy, Select);
