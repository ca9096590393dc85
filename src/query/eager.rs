//! Batched eager loading of one edge for a whole parent batch.
//!
//! Each requested edge costs exactly one statement regardless of how many
//! parents the base query returned. Rows that cannot be mapped back onto the
//! batch fail the load with [`EntError::InconsistentEdgeData`].

use std::marker::PhantomData;

use entwine_core::{EdgeDescriptor, EntError, Join, Result, SQL, Token, Value, decode_id, parse_id};
use hashbrown::{HashMap, HashSet};

use super::{Query, ShadowKeys, resolve};
use crate::entity::Entity;

/// One requested edge of a parent query, erased over the target type.
pub(crate) trait EagerLoad<P: Entity>: Send + Sync {
    fn edge(&self) -> &'static str;

    fn box_clone(&self) -> Box<dyn EagerLoad<P>>;

    /// The descriptor this loader was requested for, checked against the
    /// target type.
    fn resolve(&self) -> Result<&'static EdgeDescriptor>;

    /// Loads the edge onto every parent. Each parent ends up with an
    /// initialized slot, empty when it has no neighbors.
    fn load(&self, parents: &mut [P], shadow: &ShadowKeys) -> Result<()>;
}

pub(crate) struct EdgeLoader<P, E: Entity> {
    edge: &'static str,
    query: Query<E>,
    _parent: PhantomData<fn() -> P>,
}

impl<P, E: Entity> EdgeLoader<P, E> {
    pub(crate) fn new(edge: &'static str, query: Query<E>) -> Self {
        Self {
            edge,
            query,
            _parent: PhantomData,
        }
    }
}

impl<P: Entity, E: Entity> EagerLoad<P> for EdgeLoader<P, E> {
    fn edge(&self) -> &'static str {
        self.edge
    }

    fn box_clone(&self) -> Box<dyn EagerLoad<P>> {
        Box::new(EdgeLoader::<P, E>::new(self.edge, self.query.clone()))
    }

    fn resolve(&self) -> Result<&'static EdgeDescriptor> {
        resolve::<P, E>(self.edge)
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn load(&self, parents: &mut [P], shadow: &ShadowKeys) -> Result<()> {
        let descriptor = self.resolve()?;
        let unique = descriptor.is_unique();
        for parent in parents.iter_mut() {
            if unique {
                parent.edges_mut().init_unique::<E>(self.edge);
            } else {
                parent.edges_mut().init_many::<E>(self.edge);
            }
        }

        let children = match descriptor.join() {
            Join::OwningFk { column } => self.load_owning(parents, shadow, column)?,
            Join::InverseFk { column } => self.load_inverse(parents, column, unique)?,
            Join::JoinTable {
                table,
                parent_column,
                target_column,
            } => self.load_join_table(parents, table, parent_column, target_column, unique)?,
        };

        entwine_core::ent_trace_edge!(self.edge, parents.len(), children);
        Ok(())
    }
}

impl<P: Entity, E: Entity> EdgeLoader<P, E> {
    /// Parents hold the key: fetch each referenced target once and fan it out.
    fn load_owning(
        &self,
        parents: &mut [P],
        shadow: &ShadowKeys,
        column: &'static str,
    ) -> Result<usize> {
        let mut referenced: HashSet<String> = HashSet::new();
        let mut keys = Vec::new();
        for parent in parents.iter() {
            if let Some(fk) = shadow.get(parent.id(), column)
                && referenced.insert(fk.to_owned())
            {
                keys.push(Value::Integer(parse_id(fk)?));
            }
        }
        if keys.is_empty() {
            return Ok(0);
        }

        let target = E::SCHEMA;
        let batch = self.query.execute(
            |s| {
                let cond = in_list(s.c(target.id_column), keys);
                s.r#where(cond);
            },
            &[],
        )?;
        let mut children = batch.nodes;
        self.query.load_edges(&mut children, &batch.shadow)?;

        let mut by_id: HashMap<String, E> = HashMap::with_capacity(children.len());
        for child in children {
            if !referenced.contains(child.id()) {
                return Err(self.inconsistent(format_args!(
                    "{} {} is not referenced by any parent",
                    target.label,
                    child.id()
                )));
            }
            by_id.insert(child.id().to_owned(), child);
        }

        for parent in parents.iter_mut() {
            let Some(fk) = shadow.get(parent.id(), column) else {
                continue;
            };
            // Targets filtered out by the edge query leave the slot unset.
            if let Some(child) = by_id.get(fk) {
                self.attach(parent, child.clone(), true)?;
            }
        }
        Ok(by_id.len())
    }

    /// Targets hold the key back to their parent.
    fn load_inverse(&self, parents: &mut [P], column: &'static str, unique: bool) -> Result<usize> {
        let (index, keys) = parent_index(parents)?;

        let target = E::SCHEMA;
        let batch = self.query.execute(
            |s| {
                let cond = in_list(s.c(column), keys);
                s.r#where(cond);
            },
            &[SQL::column(target.table, column)],
        )?;
        let mut children = batch.nodes;
        self.query.load_edges(&mut children, &batch.shadow)?;

        let count = children.len();
        for (child, extras) in children.into_iter().zip(batch.extras) {
            let owner = match extras.first() {
                Some(value) if value.is_null() => {
                    return Err(self.inconsistent(format_args!(
                        "{} {} has a NULL {column}",
                        target.label,
                        child.id()
                    )));
                }
                Some(value) => decode_id(value).map_err(|err| {
                    self.inconsistent(format_args!("{}.{column}: {err}", target.label))
                })?,
                None => {
                    return Err(self.inconsistent(format_args!("missing {column} value")));
                }
            };
            let Some(&at) = index.get(owner.as_str()) else {
                return Err(self.inconsistent(format_args!(
                    "{} {} points at unknown parent {owner}",
                    target.label,
                    child.id()
                )));
            };
            self.attach(&mut parents[at], child, unique)?;
        }
        Ok(count)
    }

    /// A join table holds `(parent, target)` pairs.
    fn load_join_table(
        &self,
        parents: &mut [P],
        table: &'static str,
        parent_column: &'static str,
        target_column: &'static str,
        unique: bool,
    ) -> Result<usize> {
        let (index, keys) = parent_index(parents)?;

        let target = E::SCHEMA;
        let batch = self.query.execute(
            |s| {
                let on = SQL::column(table, target_column)
                    .push(Token::EQ)
                    .append(s.c(target.id_column));
                s.join(table, on);
                s.r#where(in_list(SQL::column(table, parent_column), keys));
            },
            &[
                SQL::column(table, parent_column),
                SQL::column(table, target_column),
            ],
        )?;

        // The same target may pair with several parents; materialize it once.
        let mut distinct: Vec<E> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(batch.nodes.len());
        for (child, extras) in batch.nodes.into_iter().zip(batch.extras) {
            let (owner, linked) = match extras.as_slice() {
                [owner, linked] => (
                    decode_id(owner).map_err(|err| {
                        self.inconsistent(format_args!("{table}.{parent_column}: {err}"))
                    })?,
                    decode_id(linked).map_err(|err| {
                        self.inconsistent(format_args!("{table}.{target_column}: {err}"))
                    })?,
                ),
                _ => {
                    return Err(self.inconsistent(format_args!("missing {table} key pair")));
                }
            };
            if linked != child.id() {
                return Err(self.inconsistent(format_args!(
                    "{table}.{target_column} {linked} does not match {} {}",
                    target.label,
                    child.id()
                )));
            }
            let Some(&at) = index.get(owner.as_str()) else {
                return Err(self.inconsistent(format_args!(
                    "{table} pairs {} {} with unknown parent {owner}",
                    target.label,
                    child.id()
                )));
            };
            let slot = match seen.get(child.id()) {
                Some(&slot) => slot,
                None => {
                    seen.insert(child.id().to_owned(), distinct.len());
                    distinct.push(child);
                    distinct.len() - 1
                }
            };
            pairs.push((at, slot));
        }

        self.query.load_edges(&mut distinct, &batch.shadow)?;

        for (at, slot) in pairs {
            self.attach(&mut parents[at], distinct[slot].clone(), unique)?;
        }
        Ok(distinct.len())
    }

    fn attach(&self, parent: &mut P, child: E, unique: bool) -> Result<()> {
        if !unique {
            parent.edges_mut().push(self.edge, child);
            return Ok(());
        }
        if parent.edges().unique::<E>(self.edge)?.is_some() {
            return Err(self.inconsistent(format_args!(
                "{} {} has more than one {}",
                P::SCHEMA.label,
                parent.id(),
                self.edge
            )));
        }
        parent.edges_mut().set(self.edge, child);
        Ok(())
    }

    fn inconsistent(&self, detail: std::fmt::Arguments<'_>) -> EntError {
        EntError::inconsistent(format!("{}.{}: {detail}", P::SCHEMA.label, self.edge))
    }
}

/// Position of every parent by id, plus the ids as bind values.
fn parent_index<P: Entity>(parents: &[P]) -> Result<(HashMap<String, usize>, Vec<Value>)> {
    let mut index = HashMap::with_capacity(parents.len());
    let mut keys = Vec::with_capacity(parents.len());
    for (at, parent) in parents.iter().enumerate() {
        if index.insert(parent.id().to_owned(), at).is_none() {
            keys.push(Value::Integer(parse_id(parent.id())?));
        }
    }
    Ok((index, keys))
}

fn in_list(column: SQL, keys: Vec<Value>) -> SQL {
    column
        .push(Token::IN)
        .append(SQL::param_list(keys).parens())
}
