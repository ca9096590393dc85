//! Composable filters, sort terms and aggregates.
//!
//! A [`Predicate`] is a function that ANDs one condition into a [`Selector`].
//! Predicates are immutable and cheaply cloned, so the same value can be
//! applied to any number of independent statements:
//!
//! ```
//! use entwine_core::predicate::{self, Predicate};
//! use entwine_core::schema::{ColumnSpec, EntitySchema};
//! use entwine_core::{Dialect, Selector};
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
//! let filter: Predicate = predicate::or([
//!     predicate::eq("name", "vpn"),
//!     predicate::has_prefix("name", "fiber"),
//! ]);
//!
//! let mut s = Selector::new(Dialect::SQLite, SERVICE.table);
//! s.add_column(s.c("id"));
//! filter.apply(&SERVICE, &mut s);
//! assert_eq!(
//!     s.build().unwrap().sql,
//!     r#"SELECT "services"."id" FROM "services" WHERE ("services"."name" = ? OR "services"."name" LIKE ? ESCAPE '\')"#
//! );
//! ```

use core::fmt;
use std::borrow::Cow;
use std::sync::Arc;

use crate::dialect::Dialect;
use crate::row::parse_id;
use crate::schema::{EdgeDescriptor, EntitySchema, Join};
use crate::sql::{Direction, SQL, Selector, Token};
use crate::value::Value;

type ApplyFn = dyn Fn(&'static EntitySchema, &mut Selector) + Send + Sync;

/// A filter condition over the entity described by the schema it is applied with.
#[derive(Clone)]
pub struct Predicate(Arc<ApplyFn>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&'static EntitySchema, &mut Selector) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// ANDs this condition into `selector`.
    #[inline]
    pub fn apply(&self, schema: &'static EntitySchema, selector: &mut Selector) {
        (self.0)(schema, selector)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Qualified column for a field of `schema`. Unknown names are recorded as
/// a deferred error on `s`.
pub fn field(schema: &'static EntitySchema, s: &mut Selector, name: &'static str) -> SQL {
    if !schema.has_column(name) && !schema.foreign_keys.contains(&name) {
        s.error(format!("unknown field {}.{}", schema.label, name));
    }
    s.c(name)
}

fn compare(name: &'static str, op: Token, value: Value) -> Predicate {
    Predicate::new(move |schema, s| {
        let cond = field(schema, s, name).push(op).append(SQL::param(value.clone()));
        s.r#where(cond);
    })
}

// =============================================================================
// Field predicates
// =============================================================================

pub fn eq(name: &'static str, value: impl Into<Value>) -> Predicate {
    compare(name, Token::EQ, value.into())
}

pub fn ne(name: &'static str, value: impl Into<Value>) -> Predicate {
    compare(name, Token::NE, value.into())
}

pub fn gt(name: &'static str, value: impl Into<Value>) -> Predicate {
    compare(name, Token::GT, value.into())
}

pub fn gte(name: &'static str, value: impl Into<Value>) -> Predicate {
    compare(name, Token::GE, value.into())
}

pub fn lt(name: &'static str, value: impl Into<Value>) -> Predicate {
    compare(name, Token::LT, value.into())
}

pub fn lte(name: &'static str, value: impl Into<Value>) -> Predicate {
    compare(name, Token::LE, value.into())
}

fn membership(column: SQL, values: &[Value], negate: bool) -> Option<SQL> {
    if values.is_empty() {
        // Nothing is a member of the empty set.
        return (!negate).then(|| SQL::token(Token::FALSE));
    }
    let mut cond = column;
    if negate {
        cond.push_mut(Token::NOT);
    }
    cond.push_mut(Token::IN);
    Some(cond.append(SQL::param_list(values.iter().cloned()).parens()))
}

/// `name IN (values)`; an empty list matches nothing.
pub fn in_values<I>(name: &'static str, values: I) -> Predicate
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    Predicate::new(move |schema, s| {
        let column = field(schema, s, name);
        if let Some(cond) = membership(column, &values, false) {
            s.r#where(cond);
        }
    })
}

/// `name NOT IN (values)`; an empty list filters nothing.
pub fn not_in<I>(name: &'static str, values: I) -> Predicate
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    Predicate::new(move |schema, s| {
        let column = field(schema, s, name);
        if let Some(cond) = membership(column, &values, true) {
            s.r#where(cond);
        }
    })
}

pub fn is_null(name: &'static str) -> Predicate {
    Predicate::new(move |schema, s| {
        let cond = field(schema, s, name).push(Token::IS).push(Token::NULL);
        s.r#where(cond);
    })
}

pub fn not_null(name: &'static str) -> Predicate {
    Predicate::new(move |schema, s| {
        let cond = field(schema, s, name)
            .push(Token::IS)
            .push(Token::NOT)
            .push(Token::NULL);
        s.r#where(cond);
    })
}

fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn escape_clause(dialect: Dialect) -> SQL {
    // MySQL string literals treat the backslash itself as an escape.
    let literal = match dialect {
        Dialect::MySQL => r"'\\'",
        Dialect::SQLite | Dialect::PostgreSQL => r"'\'",
    };
    SQL::token(Token::ESCAPE).append(SQL::raw(literal))
}

fn like(name: &'static str, pattern: String, fold: bool) -> Predicate {
    Predicate::new(move |schema, s| {
        let mut column = field(schema, s, name);
        let mut param = SQL::param(pattern.clone());
        if fold {
            column = SQL::func("LOWER", column);
            param = SQL::func("LOWER", param);
        }
        let cond = column
            .push(Token::LIKE)
            .append(param)
            .append(escape_clause(s.dialect()));
        s.r#where(cond);
    })
}

/// Substring match. SQLite's `LIKE` ignores ASCII case.
pub fn contains(name: &'static str, needle: &str) -> Predicate {
    like(name, format!("%{}%", escape_like(needle)), false)
}

pub fn has_prefix(name: &'static str, prefix: &str) -> Predicate {
    like(name, format!("{}%", escape_like(prefix)), false)
}

pub fn has_suffix(name: &'static str, suffix: &str) -> Predicate {
    like(name, format!("%{}", escape_like(suffix)), false)
}

/// Case-insensitive equality.
pub fn equal_fold(name: &'static str, value: &str) -> Predicate {
    let value = value.to_owned();
    Predicate::new(move |schema, s| {
        let cond = SQL::func("LOWER", field(schema, s, name))
            .push(Token::EQ)
            .append(SQL::func("LOWER", SQL::param(value.clone())));
        s.r#where(cond);
    })
}

/// Case-insensitive substring match.
pub fn contains_fold(name: &'static str, needle: &str) -> Predicate {
    like(name, format!("%{}%", escape_like(needle)), true)
}

// =============================================================================
// Identifier predicates
// =============================================================================

fn parse_ids<I>(ids: I) -> Result<Vec<Value>, String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    ids.into_iter()
        .map(|id| {
            parse_id(id.as_ref())
                .map(Value::Integer)
                .map_err(|err| err.to_string())
        })
        .collect()
}

fn compare_id(id: &str, op: Token) -> Predicate {
    let parsed = parse_id(id).map_err(|err| err.to_string());
    Predicate::new(move |schema, s| match &parsed {
        Ok(raw) => {
            let cond = s
                .c(schema.id_column)
                .push(op)
                .append(SQL::param(*raw));
            s.r#where(cond);
        }
        Err(msg) => {
            s.error(msg.clone());
        }
    })
}

fn id_membership<I>(ids: I, negate: bool) -> Predicate
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let parsed = parse_ids(ids);
    Predicate::new(move |schema, s| match &parsed {
        Ok(values) => {
            if let Some(cond) = membership(s.c(schema.id_column), values, negate) {
                s.r#where(cond);
            }
        }
        Err(msg) => {
            s.error(msg.clone());
        }
    })
}

pub fn id_eq(id: &str) -> Predicate {
    compare_id(id, Token::EQ)
}

pub fn id_ne(id: &str) -> Predicate {
    compare_id(id, Token::NE)
}

pub fn id_gt(id: &str) -> Predicate {
    compare_id(id, Token::GT)
}

pub fn id_gte(id: &str) -> Predicate {
    compare_id(id, Token::GE)
}

pub fn id_lt(id: &str) -> Predicate {
    compare_id(id, Token::LT)
}

pub fn id_lte(id: &str) -> Predicate {
    compare_id(id, Token::LE)
}

pub fn id_in<I>(ids: I) -> Predicate
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    id_membership(ids, false)
}

pub fn id_not_in<I>(ids: I) -> Predicate
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    id_membership(ids, true)
}

// =============================================================================
// Combinators
// =============================================================================

/// Applies `predicates` to a fresh selector over the same table and returns
/// their combined condition.
fn collect(
    predicates: &[Predicate],
    schema: &'static EntitySchema,
    s: &mut Selector,
) -> Option<SQL> {
    let mut scratch = s.scratch();
    for p in predicates {
        p.apply(schema, &mut scratch);
    }
    s.adopt_errors(&mut scratch);
    scratch.take_conditions()
}

/// All of `predicates`.
pub fn and<I>(predicates: I) -> Predicate
where
    I: IntoIterator<Item = Predicate>,
{
    let predicates: Vec<Predicate> = predicates.into_iter().collect();
    Predicate::new(move |schema, s| {
        if let Some(cond) = collect(&predicates, schema, s) {
            s.r#where(cond);
        }
    })
}

/// Any of `predicates`; an empty list matches nothing.
pub fn or<I>(predicates: I) -> Predicate
where
    I: IntoIterator<Item = Predicate>,
{
    let predicates: Vec<Predicate> = predicates.into_iter().collect();
    Predicate::new(move |schema, s| {
        let mut branches = Vec::with_capacity(predicates.len());
        for p in &predicates {
            match collect(core::slice::from_ref(p), schema, s) {
                Some(cond) => branches.push(cond),
                // A branch without a condition matches everything.
                None => return,
            }
        }
        if branches.is_empty() {
            s.r#where(SQL::token(Token::FALSE));
        } else if branches.len() == 1 {
            s.r#where(branches.remove(0));
        } else {
            s.r#where(SQL::join(branches, Token::OR).parens());
        }
    })
}

/// Negation of `predicate`.
pub fn not(predicate: Predicate) -> Predicate {
    Predicate::new(move |schema, s| {
        match collect(core::slice::from_ref(&predicate), schema, s) {
            Some(cond) => {
                s.r#where(SQL::token(Token::NOT).append(cond.parens()));
            }
            None => {
                s.r#where(SQL::token(Token::FALSE));
            }
        }
    })
}

// =============================================================================
// Edge predicates
// =============================================================================

/// A `SELECT column FROM target WHERE predicates` sub-select.
fn target_select(
    s: &mut Selector,
    target: &'static EntitySchema,
    column: &'static str,
    predicates: &[Predicate],
) -> Option<SQL> {
    let mut inner = Selector::new(s.dialect(), target.table);
    inner.add_column(inner.c(column));
    for p in predicates {
        p.apply(target, &mut inner);
    }
    s.adopt_errors(&mut inner);
    match inner.to_sql() {
        Ok(sql) => Some(sql),
        Err(err) => {
            s.error(err.to_string());
            None
        }
    }
}

fn in_subquery(column: SQL, sub: SQL) -> SQL {
    column.push(Token::IN).append(sub.parens())
}

fn edge_condition(
    schema: &'static EntitySchema,
    edge: &'static EdgeDescriptor,
    s: &mut Selector,
    predicates: &[Predicate],
) -> Option<SQL> {
    let target = edge.target();
    match edge.join() {
        Join::OwningFk { column } if predicates.is_empty() => Some(
            s.c(column)
                .push(Token::IS)
                .push(Token::NOT)
                .push(Token::NULL),
        ),
        Join::OwningFk { column } => {
            let sub = target_select(s, target, target.id_column, predicates)?;
            Some(in_subquery(s.c(column), sub))
        }
        Join::InverseFk { column } => {
            let sub = target_select(s, target, column, predicates)?;
            Some(in_subquery(s.c(schema.id_column), sub))
        }
        Join::JoinTable {
            table,
            parent_column,
            target_column,
        } => {
            let mut pairs = Selector::new(s.dialect(), table);
            pairs.add_column(pairs.c(parent_column));
            if !predicates.is_empty() {
                let sub = target_select(s, target, target.id_column, predicates)?;
                pairs.r#where(in_subquery(pairs.c(target_column), sub));
            }
            match pairs.to_sql() {
                Ok(sub) => Some(in_subquery(s.c(schema.id_column), sub)),
                Err(err) => {
                    s.error(err.to_string());
                    None
                }
            }
        }
    }
}

/// Entities with at least one neighbor over `edge`.
pub fn has_edge(edge: &'static str) -> Predicate {
    has_edge_with(edge, [])
}

/// Entities with at least one neighbor over `edge` matching `predicates`.
pub fn has_edge_with<I>(edge: &'static str, predicates: I) -> Predicate
where
    I: IntoIterator<Item = Predicate>,
{
    let predicates: Vec<Predicate> = predicates.into_iter().collect();
    Predicate::new(move |schema, s| {
        let Some(descriptor) = schema.edge(edge) else {
            s.error(format!("{} has no edge {edge:?}", schema.label));
            return;
        };
        if let Some(cond) = edge_condition(schema, descriptor, s, &predicates) {
            s.r#where(cond);
        }
    })
}

/// Targets of `edge` reachable from the rows selected by `parents`.
///
/// `parents` is a selector over `source` carrying the source query's filters
/// and pagination; its column list is replaced.
pub fn neighbors(
    source: &'static EntitySchema,
    edge: &'static EdgeDescriptor,
    parents: Selector,
) -> Predicate {
    Predicate::new(move |target, s| {
        let mut parents = parents.clone();
        let source_key = match edge.join() {
            Join::OwningFk { column } => column,
            Join::InverseFk { .. } | Join::JoinTable { .. } => source.id_column,
        };
        parents.select([parents.c(source_key)]);
        let parents_sql = match parents.to_sql() {
            Ok(sql) => sql,
            Err(err) => {
                s.error(err.to_string());
                return;
            }
        };
        let cond = match edge.join() {
            Join::OwningFk { .. } => in_subquery(s.c(target.id_column), parents_sql),
            Join::InverseFk { column } => in_subquery(s.c(column), parents_sql),
            Join::JoinTable {
                table,
                parent_column,
                target_column,
            } => {
                let mut pairs = Selector::new(s.dialect(), table);
                pairs.add_column(pairs.c(target_column));
                pairs.r#where(in_subquery(pairs.c(parent_column), parents_sql));
                match pairs.to_sql() {
                    Ok(sub) => in_subquery(s.c(target.id_column), sub),
                    Err(err) => {
                        s.error(err.to_string());
                        return;
                    }
                }
            }
        };
        s.r#where(cond);
    })
}

// =============================================================================
// Ordering
// =============================================================================

/// One `ORDER BY` term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    field: &'static str,
    direction: Direction,
}

impl Order {
    pub fn apply(&self, schema: &'static EntitySchema, s: &mut Selector) {
        let column = field(schema, s, self.field);
        s.order_by(column, self.direction);
    }

    pub const fn field(&self) -> &'static str {
        self.field
    }

    pub const fn direction(&self) -> Direction {
        self.direction
    }
}

pub const fn asc(field: &'static str) -> Order {
    Order {
        field,
        direction: Direction::Asc,
    }
}

pub const fn desc(field: &'static str) -> Order {
    Order {
        field,
        direction: Direction::Desc,
    }
}

// =============================================================================
// Aggregates
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AggregateFn {
    Count,
    Max,
    Min,
    Sum,
    Mean,
}

impl AggregateFn {
    const fn sql_name(self) -> &'static str {
        match self {
            AggregateFn::Count => "COUNT",
            AggregateFn::Max => "MAX",
            AggregateFn::Min => "MIN",
            AggregateFn::Sum => "SUM",
            AggregateFn::Mean => "AVG",
        }
    }

    const fn default_alias(self) -> &'static str {
        match self {
            AggregateFn::Count => "count",
            AggregateFn::Max => "max",
            AggregateFn::Min => "min",
            AggregateFn::Sum => "sum",
            AggregateFn::Mean => "mean",
        }
    }
}

/// An aggregate column for group-by views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    func: AggregateFn,
    field: Option<&'static str>,
    alias: Option<Cow<'static, str>>,
}

impl Aggregate {
    const fn new(func: AggregateFn, field: Option<&'static str>) -> Self {
        Self {
            func,
            field,
            alias: None,
        }
    }

    /// Names the output column.
    pub fn alias(mut self, alias: impl Into<Cow<'static, str>>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn to_sql(&self, schema: &'static EntitySchema, s: &mut Selector) -> SQL {
        let arg = match self.field {
            Some(name) => field(schema, s, name),
            None => SQL::token(Token::STAR),
        };
        let alias = self
            .alias
            .clone()
            .unwrap_or(Cow::Borrowed(self.func.default_alias()));
        SQL::func(self.func.sql_name(), arg).alias(alias)
    }
}

/// `COUNT(*)`
pub const fn count() -> Aggregate {
    Aggregate::new(AggregateFn::Count, None)
}

/// `COUNT(field)`, which skips NULLs.
pub const fn count_of(field: &'static str) -> Aggregate {
    Aggregate::new(AggregateFn::Count, Some(field))
}

pub const fn max(field: &'static str) -> Aggregate {
    Aggregate::new(AggregateFn::Max, Some(field))
}

pub const fn min(field: &'static str) -> Aggregate {
    Aggregate::new(AggregateFn::Min, Some(field))
}

pub const fn sum(field: &'static str) -> Aggregate {
    Aggregate::new(AggregateFn::Sum, Some(field))
}

pub const fn mean(field: &'static str) -> Aggregate {
    Aggregate::new(AggregateFn::Mean, Some(field))
}
