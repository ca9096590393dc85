mod chunk;
mod selector;
mod token;

use std::borrow::Cow;

pub use chunk::*;
pub use selector::*;
use smallvec::SmallVec;
pub use token::*;

use crate::dialect::Dialect;
use crate::value::Value;

/// SQL fragment builder with flat chunk storage.
///
/// Uses `SmallVec<[SQLChunk; 8]>` for inline storage of typical fragments
/// without heap allocation. Parameters are numbered when the outermost
/// fragment is rendered, so fragments (sub-selects included) nest freely.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SQL {
    pub chunks: SmallVec<[SQLChunk; 8]>,
}

impl SQL {
    // ==================== constructors ====================

    /// Creates an empty SQL fragment
    #[inline]
    pub const fn empty() -> Self {
        Self {
            chunks: SmallVec::new_const(),
        }
    }

    /// Creates SQL with a single token
    #[inline]
    pub fn token(t: Token) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Token(t)],
        }
    }

    /// Creates SQL with a quoted identifier
    #[inline]
    pub fn ident(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Ident(name.into())],
        }
    }

    /// Creates SQL referencing `table`.`column`
    #[inline]
    pub fn column(
        table: impl Into<Cow<'static, str>>,
        column: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Column {
                table: table.into(),
                column: column.into(),
            }],
        }
    }

    /// Creates SQL with raw text (unquoted)
    #[inline]
    pub fn raw(text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Raw(text.into())],
        }
    }

    /// Creates SQL with a single unsigned integer literal.
    #[inline]
    pub fn number(value: u64) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Number(value)],
        }
    }

    /// Creates SQL with a single parameter value
    #[inline]
    pub fn param(value: impl Into<Value>) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Param(value.into())],
        }
    }

    /// Creates SQL for a function call: NAME(args)
    pub fn func(name: &'static str, args: SQL) -> Self {
        let args = if args.is_subquery() {
            args.parens()
        } else {
            args
        };
        SQL::raw(format!("{name}("))
            .append(args)
            .push(Token::RPAREN)
    }

    /// Creates a comma-separated list of parameters.
    pub fn param_list<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let iter = values.into_iter();
        let (lower, _) = iter.size_hint();
        let mut chunks = SmallVec::with_capacity(lower.saturating_mul(2));
        for (i, v) in iter.enumerate() {
            if i > 0 {
                chunks.push(SQLChunk::Token(Token::COMMA));
            }
            chunks.push(SQLChunk::Param(v.into()));
        }
        SQL { chunks }
    }

    // ==================== builder methods ====================

    /// Append another SQL fragment (flat extend)
    #[inline]
    pub fn append(mut self, other: impl Into<SQL>) -> Self {
        let other = other.into();
        if self.chunks.is_empty() {
            return other;
        }
        self.chunks.extend(other.chunks);
        self
    }

    #[inline]
    pub fn append_mut(&mut self, other: impl Into<SQL>) {
        let other = other.into();
        if self.chunks.is_empty() {
            self.chunks = other.chunks;
            return;
        }
        self.chunks.extend(other.chunks);
    }

    /// Push a single chunk
    #[inline]
    pub fn push(mut self, chunk: impl Into<SQLChunk>) -> Self {
        self.chunks.push(chunk.into());
        self
    }

    #[inline]
    pub fn push_mut(&mut self, chunk: impl Into<SQLChunk>) {
        self.chunks.push(chunk.into());
    }

    // ==================== combinators ====================

    /// Joins multiple SQL fragments with a separator
    pub fn join<I>(sqls: I, separator: Token) -> SQL
    where
        I: IntoIterator<Item = SQL>,
    {
        let mut iter = sqls.into_iter();
        let Some(mut result) = iter.next() else {
            return SQL::empty();
        };
        for item in iter {
            result.chunks.push(SQLChunk::Token(separator));
            result.chunks.extend(item.chunks);
        }
        result
    }

    /// Wrap in parentheses: (self)
    #[inline]
    pub fn parens(self) -> Self {
        SQL::token(Token::LPAREN).append(self).push(Token::RPAREN)
    }

    /// Check if this SQL fragment is a subquery (starts with SELECT)
    #[inline]
    pub fn is_subquery(&self) -> bool {
        matches!(self.chunks.first(), Some(SQLChunk::Token(Token::SELECT)))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Creates an aliased version: self AS "name"
    pub fn alias(self, name: impl Into<Cow<'static, str>>) -> SQL {
        self.push(Token::AS).push(SQLChunk::Ident(name.into()))
    }

    // ==================== output methods ====================

    /// Renders the fragment for `dialect`, returning the text and the
    /// parameter values in placeholder order.
    pub fn build(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let sql_cap = self.chunks.len().saturating_mul(8).max(64);
        let mut buf = String::with_capacity(sql_cap);
        let mut args = Vec::new();
        let mut param_index = 1usize;

        for (i, chunk) in self.chunks.iter().enumerate() {
            chunk.write(dialect, &mut buf, &mut param_index);
            if let SQLChunk::Param(value) = chunk {
                args.push(value.clone());
            }
            if self.needs_space(i) {
                buf.push(' ');
            }
        }

        (buf, args)
    }

    /// Returns only the SQL text for `dialect`.
    pub fn sql(&self, dialect: Dialect) -> String {
        self.build(dialect).0
    }

    /// Returns an iterator over references to parameter values
    pub fn params(&self) -> impl Iterator<Item = &Value> {
        self.chunks.iter().filter_map(|chunk| match chunk {
            SQLChunk::Param(value) => Some(value),
            _ => None,
        })
    }

    fn needs_space(&self, index: usize) -> bool {
        let Some(next) = self.chunks.get(index + 1) else {
            return false;
        };
        chunk_needs_space(&self.chunks[index], next)
    }
}

/// Canonical spacing logic for SQL chunk rendering.
pub(crate) fn chunk_needs_space(current: &SQLChunk, next: &SQLChunk) -> bool {
    // No space after raw text ending with a space or an opening paren ("COUNT(")
    if let SQLChunk::Raw(text) = current
        && (text.ends_with(' ') || text.ends_with('('))
    {
        return false;
    }

    // No space if next raw text starts with space
    if let SQLChunk::Raw(text) = next
        && text.starts_with(' ')
    {
        return false;
    }

    match (current, next) {
        // No space before closing/separator punctuation
        (_, SQLChunk::Token(Token::RPAREN | Token::COMMA)) => false,
        // No space after opening punctuation
        (SQLChunk::Token(Token::LPAREN), _) => false,
        // Space after comma
        (SQLChunk::Token(Token::COMMA), _) => true,
        // Space after closing paren if next is word-like (e.g., ") AND")
        (SQLChunk::Token(Token::RPAREN), next) => next.is_word_like(),
        // Space before opening paren if preceded by word-like (e.g., "IN (")
        (current, SQLChunk::Token(Token::LPAREN)) => current.is_word_like(),
        // Space around comparison operators
        (SQLChunk::Token(t), _) if t.is_operator() => true,
        (_, SQLChunk::Token(t)) if t.is_operator() => true,
        // Space between all word-like chunks
        _ => current.is_word_like() && next.is_word_like(),
    }
}

// ==================== trait implementations ====================

impl From<Token> for SQL {
    fn from(value: Token) -> Self {
        SQL::token(value)
    }
}

impl From<SQLChunk> for SQL {
    fn from(value: SQLChunk) -> Self {
        Self {
            chunks: smallvec::smallvec![value],
        }
    }
}

impl FromIterator<SQLChunk> for SQL {
    fn from_iter<I: IntoIterator<Item = SQLChunk>>(iter: I) -> Self {
        Self {
            chunks: SmallVec::from_iter(iter),
        }
    }
}

impl IntoIterator for SQL {
    type Item = SQLChunk;
    type IntoIter = smallvec::IntoIter<[SQLChunk; 8]>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_around_operators_and_lists() {
        let sql = SQL::column("services", "id")
            .push(Token::IN)
            .append(SQL::param_list([1, 2, 3]).parens())
            .push(Token::AND)
            .append(SQL::column("services", "name"))
            .push(Token::EQ)
            .append(SQL::param("x"));
        let (text, args) = sql.build(Dialect::SQLite);
        assert_eq!(
            text,
            r#""services"."id" IN (?, ?, ?) AND "services"."name" = ?"#
        );
        assert_eq!(args.len(), 4);
    }

    #[test]
    fn numbered_placeholders_follow_render_order() {
        let inner = SQL::token(Token::SELECT)
            .append(SQL::column("links", "a"))
            .push(Token::FROM)
            .append(SQL::ident("links"))
            .push(Token::WHERE)
            .append(SQL::column("links", "b"))
            .push(Token::EQ)
            .append(SQL::param(2));
        let outer = SQL::column("t", "x")
            .push(Token::EQ)
            .append(SQL::param(1))
            .push(Token::AND)
            .append(SQL::column("t", "id"))
            .push(Token::IN)
            .append(inner.parens());
        let (text, args) = outer.build(Dialect::PostgreSQL);
        assert_eq!(
            text,
            r#""t"."x" = $1 AND "t"."id" IN (SELECT "links"."a" FROM "links" WHERE "links"."b" = $2)"#
        );
        assert_eq!(args, vec![Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn function_calls_and_aliases() {
        let sql = SQL::func("COUNT", SQL::token(Token::STAR)).alias("count");
        assert_eq!(sql.sql(Dialect::MySQL), "COUNT(*) AS `count`");
    }
}
