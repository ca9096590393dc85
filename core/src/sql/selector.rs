use core::fmt;

use smallvec::SmallVec;

use crate::dialect::Dialect;
use crate::error::{EntError, Result};
use crate::sql::{SQL, Token};
use crate::value::Value;

/// Sort direction for `ORDER BY` terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    const fn token(self) -> Token {
        match self {
            Direction::Asc => Token::ASC,
            Direction::Desc => Token::DESC,
        }
    }
}

/// A rendered statement ready for a driver.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Accumulates the clauses of one `SELECT` statement.
///
/// Every list is owned, so `clone()` yields a fully independent builder; only
/// the `'static` table name is shared. Problems found while applying
/// predicates (an unparseable identifier, say) are recorded with
/// [`Selector::error`] and surface from [`Selector::build`].
#[derive(Debug, Clone)]
pub struct Selector {
    dialect: Dialect,
    table: &'static str,
    columns: SmallVec<[SQL; 8]>,
    distinct: bool,
    joins: Vec<SQL>,
    wheres: Vec<SQL>,
    group_by: Vec<SQL>,
    order_by: Vec<SQL>,
    limit: Option<u64>,
    offset: Option<u64>,
    errors: Vec<String>,
}

impl Selector {
    pub fn new(dialect: Dialect, table: &'static str) -> Self {
        Self {
            dialect,
            table,
            columns: SmallVec::new(),
            distinct: false,
            joins: Vec::new(),
            wheres: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            errors: Vec::new(),
        }
    }

    #[inline]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    #[inline]
    pub const fn table(&self) -> &'static str {
        self.table
    }

    /// Table-qualified column of the `FROM` table.
    #[inline]
    pub fn c(&self, column: &'static str) -> SQL {
        SQL::column(self.table, column)
    }

    /// Replaces the selected columns.
    pub fn select<I>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = SQL>,
    {
        self.columns = columns.into_iter().collect();
        self
    }

    pub fn add_column(&mut self, column: SQL) -> &mut Self {
        self.columns.push(column);
        self
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn from(&mut self, table: &'static str) -> &mut Self {
        self.table = table;
        self
    }

    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct = distinct;
        self
    }

    /// Adds a condition, ANDed with the existing ones.
    pub fn r#where(&mut self, condition: SQL) -> &mut Self {
        if !condition.is_empty() {
            self.wheres.push(condition);
        }
        self
    }

    /// Adds `JOIN table ON on`.
    pub fn join(&mut self, table: &'static str, on: SQL) -> &mut Self {
        self.joins.push(
            SQL::token(Token::JOIN)
                .append(SQL::ident(table))
                .push(Token::ON)
                .append(on),
        );
        self
    }

    pub fn group_by(&mut self, expr: SQL) -> &mut Self {
        self.group_by.push(expr);
        self
    }

    /// Appends a sort term; earlier terms take precedence.
    pub fn order_by(&mut self, expr: SQL, direction: Direction) -> &mut Self {
        self.order_by.push(expr.push(direction.token()));
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    pub fn clear_order(&mut self) -> &mut Self {
        self.order_by.clear();
        self
    }

    pub fn clear_pagination(&mut self) -> &mut Self {
        self.limit = None;
        self.offset = None;
        self
    }

    /// Records a problem reported by [`Selector::build`].
    pub fn error(&mut self, msg: impl Into<String>) -> &mut Self {
        self.errors.push(msg.into());
        self
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Moves the recorded errors of `other` into this selector.
    pub fn adopt_errors(&mut self, other: &mut Selector) -> &mut Self {
        self.errors.append(&mut other.errors);
        self
    }

    /// An empty selector over the same table, used to collect the
    /// conditions of nested predicates.
    pub fn scratch(&self) -> Selector {
        Selector::new(self.dialect, self.table)
    }

    /// Removes and returns the accumulated conditions as one fragment.
    /// Several conditions come back parenthesized and ANDed.
    pub fn take_conditions(&mut self) -> Option<SQL> {
        match self.wheres.len() {
            0 => None,
            1 => self.wheres.pop(),
            _ => Some(SQL::join(self.wheres.drain(..), Token::AND).parens()),
        }
    }

    pub fn has_conditions(&self) -> bool {
        !self.wheres.is_empty()
    }

    fn check(&self) -> Result<()> {
        if let Some(first) = self.errors.first() {
            return Err(EntError::invalid(first.clone()));
        }
        if self.columns.is_empty() {
            return Err(EntError::invalid(format!(
                "select on {:?} has no columns",
                self.table
            )));
        }
        Ok(())
    }

    /// Renders the statement as a fragment for embedding as a sub-select.
    pub fn to_sql(&self) -> Result<SQL> {
        self.check()?;

        let mut sql = SQL::token(Token::SELECT);
        if self.distinct {
            sql.push_mut(Token::DISTINCT);
        }
        sql.append_mut(SQL::join(self.columns.iter().cloned(), Token::COMMA));
        sql.push_mut(Token::FROM);
        sql.append_mut(SQL::ident(self.table));

        for join in &self.joins {
            sql.append_mut(join.clone());
        }
        if !self.wheres.is_empty() {
            sql.push_mut(Token::WHERE);
            sql.append_mut(SQL::join(self.wheres.iter().cloned(), Token::AND));
        }
        if !self.group_by.is_empty() {
            sql.push_mut(Token::GROUP_BY);
            sql.append_mut(SQL::join(self.group_by.iter().cloned(), Token::COMMA));
        }
        if !self.order_by.is_empty() {
            sql.push_mut(Token::ORDER_BY);
            sql.append_mut(SQL::join(self.order_by.iter().cloned(), Token::COMMA));
        }
        match (self.limit, self.offset) {
            (Some(limit), offset) => {
                sql.push_mut(Token::LIMIT);
                sql.append_mut(SQL::number(limit));
                if let Some(offset) = offset {
                    sql.push_mut(Token::OFFSET);
                    sql.append_mut(SQL::number(offset));
                }
            }
            // OFFSET is only valid after a LIMIT.
            (None, Some(offset)) => {
                sql.push_mut(Token::LIMIT);
                sql.append_mut(SQL::number(Dialect::MAX_LIMIT));
                sql.push_mut(Token::OFFSET);
                sql.append_mut(SQL::number(offset));
            }
            (None, None) => {}
        }
        Ok(sql)
    }

    pub fn build(&self) -> Result<Statement> {
        let (sql, args) = self.to_sql()?.build(self.dialect);
        Ok(Statement { sql, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn services() -> Selector {
        let mut s = Selector::new(Dialect::SQLite, "services");
        let cols = [s.c("id"), s.c("name")];
        s.select(cols);
        s
    }

    #[test]
    fn renders_clauses_in_order() {
        let mut s = services();
        let name = s.c("name");
        let id = s.c("id");
        s.r#where(name.clone().push(Token::EQ).append(SQL::param("vpn")))
            .r#where(id.clone().push(Token::GT).append(SQL::param(3)))
            .order_by(name, Direction::Asc)
            .order_by(id, Direction::Desc)
            .limit(10)
            .offset(20);
        let stmt = s.build().unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT "services"."id", "services"."name" FROM "services" WHERE "services"."name" = ? AND "services"."id" > ? ORDER BY "services"."name" ASC, "services"."id" DESC LIMIT 10 OFFSET 20"#
        );
        assert_eq!(stmt.args, vec![Value::from("vpn"), Value::Integer(3)]);
    }

    #[test]
    fn offset_without_limit_uses_sentinel() {
        let mut s = services();
        s.offset(5);
        let stmt = s.build().unwrap();
        assert!(stmt.sql.ends_with("LIMIT 2147483647 OFFSET 5"), "{}", stmt.sql);
    }

    #[test]
    fn zero_columns_is_rejected() {
        let s = Selector::new(Dialect::SQLite, "services");
        assert!(matches!(s.build(), Err(EntError::InvalidQuery(_))));
    }

    #[test]
    fn deferred_errors_fail_the_build() {
        let mut s = services();
        s.error("bad id");
        let err = s.build().unwrap_err();
        assert_eq!(err.to_string(), "invalid query: bad id");
    }

    #[test]
    fn clones_do_not_share_clause_lists() {
        let base = services();
        let mut copy = base.clone();
        let id = copy.c("id");
        copy.r#where(id.push(Token::EQ).append(SQL::param(1)));
        assert!(!base.has_conditions());
        assert!(copy.has_conditions());
    }

    #[test]
    fn joins_and_groups_render() {
        let mut s = Selector::new(Dialect::PostgreSQL, "services");
        s.select([SQL::column("services", "type_id"), SQL::func("COUNT", SQL::token(Token::STAR))])
            .join(
                "service_types",
                SQL::column("service_types", "id")
                    .push(Token::EQ)
                    .append(SQL::column("services", "type_id")),
            )
            .r#where(SQL::column("service_types", "name").push(Token::EQ).append(SQL::param("l2")))
            .group_by(SQL::column("services", "type_id"))
            .distinct(true);
        let stmt = s.build().unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT DISTINCT "services"."type_id", COUNT(*) FROM "services" JOIN "service_types" ON "service_types"."id" = "services"."type_id" WHERE "service_types"."name" = $1 GROUP BY "services"."type_id""#
        );
    }
}
