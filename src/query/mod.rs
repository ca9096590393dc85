//! The per-entity query builder and its execution.
//!
//! # Architecture
//!
//! ```text
//! Query<T> ── selector() ──▶ Selector ── build() ──▶ Statement ──▶ Client ──▶ Rows
//!    │                                                                     │
//!    │                           materialize + shadow foreign keys ◀──────┘
//!    └── with_edge(..) ──▶ EdgeLoader per edge ── one batched query each ──▶ stitched graph
//! ```
//!
//! Builders are values: configuration methods take and return `self`, and
//! terminal operations borrow, so a configured query can run any number of
//! times. `clone()` yields an independent copy.

mod eager;
mod select;

use std::marker::PhantomData;

use entwine_core::predicate::{self, Aggregate, Order, Predicate};
use entwine_core::{
    EntError, EntitySchema, Join, Result, Row, SQL, Selector, Token, Value, decode_id,
};
use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::client::Client;
use crate::entity::{Entity, materialize};

use eager::{EagerLoad, EdgeLoader};
pub use select::{GroupBy, Select};

/// Values of a row beyond the entity's declared columns.
pub(crate) type Extras = SmallVec<[Value; 2]>;

/// Owning-side foreign keys fetched alongside a batch, keyed by entity id.
///
/// Never exposed on the entities themselves.
#[derive(Debug, Default)]
pub(crate) struct ShadowKeys {
    columns: SmallVec<[&'static str; 2]>,
    keys: HashMap<String, SmallVec<[Option<String>; 2]>>,
}

impl ShadowKeys {
    /// Foreign key held by entity `id` in `column`; `None` when NULL.
    pub(crate) fn get(&self, id: &str, column: &str) -> Option<&str> {
        let index = self.columns.iter().position(|c| *c == column)?;
        self.keys.get(id)?.get(index)?.as_deref()
    }
}

/// Rows of one executed statement, decoded.
pub(crate) struct Batch<T> {
    pub nodes: Vec<T>,
    pub extras: Vec<Extras>,
    pub shadow: ShadowKeys,
}

/// A query over entities of type `T`.
pub struct Query<T: Entity> {
    client: Client,
    predicates: Vec<Predicate>,
    order: Vec<Order>,
    limit: Option<u64>,
    offset: Option<u64>,
    unique: Option<bool>,
    edges: Vec<Box<dyn EagerLoad<T>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            predicates: self.predicates.clone(),
            order: self.order.clone(),
            limit: self.limit,
            offset: self.offset,
            unique: self.unique,
            edges: self.edges.iter().map(|e| e.box_clone()).collect(),
            _marker: PhantomData,
        }
    }
}

impl<T: Entity> std::fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("entity", &T::SCHEMA.label)
            .field("predicates", &self.predicates.len())
            .field("order", &self.order)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("unique", &self.unique)
            .field(
                "edges",
                &self.edges.iter().map(|e| e.edge()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<T: Entity> Query<T> {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            predicates: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            unique: None,
            edges: Vec::new(),
            _marker: PhantomData,
        }
    }

    // ==================== configuration ====================

    /// Adds a filter, ANDed with the others.
    pub fn r#where(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Adds several filters, ANDed with the others.
    pub fn where_all<I>(mut self, predicates: I) -> Self
    where
        I: IntoIterator<Item = Predicate>,
    {
        self.predicates.extend(predicates);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips `offset` rows. Without a limit the result is unbounded.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Appends a sort term. Without any, row order is whatever the store
    /// returns and is not guaranteed to be stable.
    pub fn order(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    /// Toggles `SELECT DISTINCT`.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    /// Eager-loads `edge`, configuring its batched query with `configure`.
    ///
    /// The configured limit, offset and order apply to the whole edge query,
    /// not to each parent. Unknown edges, or edges whose target is not `E`,
    /// fail with [`EntError::InvalidQuery`] when the query runs.
    pub fn with_edge<E, F>(mut self, edge: &'static str, configure: F) -> Self
    where
        E: Entity,
        F: FnOnce(Query<E>) -> Query<E>,
    {
        let query = configure(Query::new(self.client.clone()));
        self.edges.retain(|loader| loader.edge() != edge);
        self.edges.push(Box::new(EdgeLoader::new(edge, query)));
        self
    }

    /// Eager-loads `edge` without extra configuration.
    pub fn with<E: Entity>(self, edge: &'static str) -> Self {
        self.with_edge::<E, _>(edge, |q| q)
    }

    /// A query over the neighbors along `edge` of the entities this query
    /// selects, rendered as one statement.
    pub fn query_edge<E: Entity>(&self, edge: &'static str) -> Query<E> {
        let neighbors = match resolve::<T, E>(edge) {
            Ok(descriptor) => predicate::neighbors(T::SCHEMA, descriptor, self.selector()),
            Err(err) => {
                let msg = err.to_string();
                Predicate::new(move |_, s| {
                    s.error(msg.clone());
                })
            }
        };
        Query::new(self.client.clone()).r#where(neighbors)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    // ==================== terminal operations ====================

    /// Runs the query and loads every requested edge.
    ///
    /// Fails as a whole if any edge fails to load.
    pub fn all(&self) -> Result<Vec<T>> {
        let batch = self.execute(|_| {}, &[])?;
        let mut nodes = batch.nodes;
        self.load_edges(&mut nodes, &batch.shadow)?;
        Ok(nodes)
    }

    /// The first entity, or [`EntError::NotFound`].
    pub fn first(&self) -> Result<T> {
        self.clone()
            .limit(1)
            .all()?
            .into_iter()
            .next()
            .ok_or(EntError::NotFound {
                label: T::SCHEMA.label,
            })
    }

    /// The single matching entity. Zero rows fail with
    /// [`EntError::NotFound`], two or more with [`EntError::NotSingular`].
    pub fn only(&self) -> Result<T> {
        let mut nodes = self.clone().limit(2).all()?;
        match nodes.len() {
            1 => Ok(nodes.remove(0)),
            0 => Err(EntError::NotFound {
                label: T::SCHEMA.label,
            }),
            _ => Err(EntError::NotSingular {
                label: T::SCHEMA.label,
            }),
        }
    }

    /// Identifiers of the matching entities, selecting only the id column.
    pub fn ids(&self) -> Result<Vec<String>> {
        let schema = T::SCHEMA;
        let mut s = self.selector();
        s.select([s.c(schema.id_column)]);
        let rows = self.client.query_raw(&s.build()?)?;
        rows.into_iter()
            .map(|row| match row.get(0) {
                Some(value) => decode_id(value)
                    .map_err(|err| EntError::mismatch(format!("{}.{}: {err}", schema.label, schema.id_column))),
                None => Err(EntError::mismatch(format!("{}: empty row", schema.label))),
            })
            .collect()
    }

    pub fn first_id(&self) -> Result<String> {
        self.clone()
            .limit(1)
            .ids()?
            .into_iter()
            .next()
            .ok_or(EntError::NotFound {
                label: T::SCHEMA.label,
            })
    }

    pub fn only_id(&self) -> Result<String> {
        let mut ids = self.clone().limit(2).ids()?;
        match ids.len() {
            1 => Ok(ids.remove(0)),
            0 => Err(EntError::NotFound {
                label: T::SCHEMA.label,
            }),
            _ => Err(EntError::NotSingular {
                label: T::SCHEMA.label,
            }),
        }
    }

    /// Number of matching entities. Limit, offset and order are ignored.
    pub fn count(&self) -> Result<usize> {
        let mut s = self.selector();
        s.clear_order().clear_pagination().distinct(false);
        let id = s.c(T::SCHEMA.id_column);
        let counted = if self.unique == Some(true) {
            SQL::func("COUNT", SQL::token(Token::DISTINCT).append(id))
        } else {
            SQL::func("COUNT", SQL::token(Token::STAR))
        };
        s.select([counted]);
        let rows = self.client.query_raw(&s.build()?)?;
        let value = rows
            .rows
            .first()
            .and_then(|row| row.get(0))
            .and_then(Value::as_integer)
            .ok_or_else(|| EntError::mismatch("COUNT returned no integer"))?;
        usize::try_from(value)
            .map_err(|_| EntError::mismatch(format!("COUNT returned {value}")))
    }

    /// Whether any entity matches; the same answer as `count()? > 0`.
    /// Limit, offset and order are ignored.
    pub fn exist(&self) -> Result<bool> {
        let mut s = self.selector();
        s.clear_order().clear_pagination().distinct(false);
        s.select([s.c(T::SCHEMA.id_column)]);
        s.limit(1);
        let rows = self.client.query_raw(&s.build()?)?;
        Ok(!rows.rows.is_empty())
    }

    /// Groups by `fields`; add aggregates with [`GroupBy::aggregate`].
    /// Requested edges are not loaded.
    pub fn group_by<I>(&self, fields: I) -> GroupBy<T>
    where
        I: IntoIterator<Item = &'static str>,
    {
        GroupBy::new(self.clone(), fields.into_iter().collect())
    }

    /// Projects `fields`. Requested edges are not loaded.
    pub fn select<I>(&self, fields: I) -> Select<T>
    where
        I: IntoIterator<Item = &'static str>,
    {
        Select::new(self.clone(), fields.into_iter().collect())
    }

    /// Shorthand for `group_by(fields).aggregate(..)` style chains.
    pub fn aggregate(&self, aggregate: Aggregate) -> GroupBy<T> {
        GroupBy::new(self.clone(), Vec::new()).aggregate(aggregate)
    }

    // ==================== execution ====================

    /// Filters, ordering, pagination and distinct flag, with no columns.
    pub(crate) fn selector(&self) -> Selector {
        let schema = T::SCHEMA;
        let mut s = Selector::new(self.client.dialect(), schema.table);
        for p in &self.predicates {
            p.apply(schema, &mut s);
        }
        for o in &self.order {
            o.apply(schema, &mut s);
        }
        if let Some(limit) = self.limit {
            s.limit(limit);
        }
        if let Some(offset) = self.offset {
            s.offset(offset);
        }
        if let Some(unique) = self.unique {
            s.distinct(unique);
        }
        s
    }

    /// Owning foreign-key columns the requested edges need.
    fn shadow_columns(&self) -> Result<SmallVec<[&'static str; 2]>> {
        let mut columns = SmallVec::new();
        for loader in &self.edges {
            if let Join::OwningFk { column } = loader.resolve()?.join()
                && !columns.contains(&column)
            {
                columns.push(column);
            }
        }
        Ok(columns)
    }

    /// Runs the base statement: declared columns, shadow keys, then `extra`.
    ///
    /// `customize` adds conditions or joins before rendering.
    pub(crate) fn execute<F>(&self, customize: F, extra: &[SQL]) -> Result<Batch<T>>
    where
        F: FnOnce(&mut Selector),
    {
        let schema = T::SCHEMA;
        let shadow_columns = self.shadow_columns()?;

        let mut s = self.selector();
        let columns: Vec<SQL> = schema
            .column_names()
            .chain(shadow_columns.iter().copied())
            .map(|c| s.c(c))
            .chain(extra.iter().cloned())
            .collect();
        s.select(columns);
        customize(&mut s);

        let rows = self.client.query_raw(&s.build()?)?;

        let declared = schema.columns.len();
        let width = declared + shadow_columns.len() + extra.len();
        let mut batch = Batch {
            nodes: Vec::with_capacity(rows.len()),
            extras: Vec::with_capacity(rows.len()),
            shadow: ShadowKeys {
                columns: shadow_columns.clone(),
                keys: HashMap::new(),
            },
        };
        for row in rows {
            if row.len() != width {
                return Err(EntError::mismatch(format!(
                    "{}: expected {width} columns, got {}",
                    schema.label,
                    row.len()
                )));
            }
            let node: T = materialize(&row)?;
            if !shadow_columns.is_empty() {
                let keys = decode_shadow(schema, &shadow_columns, &row, declared)?;
                batch.shadow.keys.insert(node.id().to_owned(), keys);
            }
            batch
                .extras
                .push(row.values()[declared + shadow_columns.len()..].iter().cloned().collect());
            batch.nodes.push(node);
        }
        Ok(batch)
    }

    /// Loads every requested edge onto `nodes`, one query per edge.
    pub(crate) fn load_edges(&self, nodes: &mut [T], shadow: &ShadowKeys) -> Result<()> {
        if nodes.is_empty() {
            return Ok(());
        }
        for loader in &self.edges {
            loader.load(nodes, shadow)?;
        }
        Ok(())
    }
}

fn decode_shadow(
    schema: &'static EntitySchema,
    columns: &[&'static str],
    row: &Row,
    start: usize,
) -> Result<SmallVec<[Option<String>; 2]>> {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| match row.get(start + i) {
            Some(value) if value.is_null() => Ok(None),
            Some(value) => decode_id(value).map(Some).map_err(|err| {
                EntError::mismatch(format!("{}.{column}: {err}", schema.label))
            }),
            None => Err(EntError::mismatch(format!(
                "{}.{column}: missing foreign key",
                schema.label
            ))),
        })
        .collect()
}

/// Looks up `edge` on `P` and checks that it leads to `E`.
pub(crate) fn resolve<P: Entity, E: Entity>(
    edge: &'static str,
) -> Result<&'static entwine_core::EdgeDescriptor> {
    let source = P::SCHEMA;
    let descriptor = source
        .edge(edge)
        .ok_or_else(|| EntError::invalid(format!("{} has no edge {edge:?}", source.label)))?;
    if !std::ptr::eq(descriptor.target(), E::SCHEMA) {
        return Err(EntError::invalid(format!(
            "edge {}.{edge} leads to {}, not {}",
            source.label,
            descriptor.target().label,
            E::SCHEMA.label
        )));
    }
    Ok(descriptor)
}
