use std::borrow::Cow;

use crate::dialect::Dialect;
use crate::sql::token::Token;
use crate::value::Value;

/// A SQL chunk represents a part of an SQL statement.
///
/// - `Token` - SQL keywords and operators (SELECT, FROM, =, etc.)
/// - `Ident` - Quoted identifiers ("table_name")
/// - `Column` - Table-qualified column ("table"."column")
/// - `Raw` - Unquoted raw SQL text (function names, literals)
/// - `Number` - Inline unsigned integer (LIMIT / OFFSET values)
/// - `Param` - Bound parameter, rendered as a dialect placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SQLChunk {
    Token(Token),
    Ident(Cow<'static, str>),
    Column {
        table: Cow<'static, str>,
        column: Cow<'static, str>,
    },
    Raw(Cow<'static, str>),
    Number(u64),
    Param(Value),
}

impl SQLChunk {
    /// Write chunk content to buffer. `param_index` is the 1-based index of
    /// the next placeholder and is advanced for every parameter written.
    pub(crate) fn write(
        &self,
        dialect: Dialect,
        buf: &mut impl core::fmt::Write,
        param_index: &mut usize,
    ) {
        match self {
            SQLChunk::Token(token) => {
                let _ = buf.write_str(token.as_str());
            }
            SQLChunk::Ident(name) => dialect.write_ident(name, buf),
            SQLChunk::Column { table, column } => {
                dialect.write_ident(table, buf);
                let _ = buf.write_char('.');
                dialect.write_ident(column, buf);
            }
            SQLChunk::Raw(text) => {
                let _ = buf.write_str(text);
            }
            SQLChunk::Number(n) => {
                let _ = write!(buf, "{n}");
            }
            SQLChunk::Param(_) => {
                dialect.write_placeholder(*param_index, buf);
                *param_index += 1;
            }
        }
    }

    /// Check if this chunk is "word-like" (needs space separation from other word-like chunks)
    #[inline]
    pub(crate) const fn is_word_like(&self) -> bool {
        match self {
            SQLChunk::Token(t) => !matches!(
                t,
                Token::LPAREN | Token::RPAREN | Token::COMMA
            ) && !t.is_operator(),
            SQLChunk::Ident(_)
            | SQLChunk::Column { .. }
            | SQLChunk::Raw(_)
            | SQLChunk::Number(_)
            | SQLChunk::Param(_) => true,
        }
    }
}

impl From<Token> for SQLChunk {
    #[inline]
    fn from(value: Token) -> Self {
        Self::Token(value)
    }
}

impl From<Value> for SQLChunk {
    #[inline]
    fn from(value: Value) -> Self {
        Self::Param(value)
    }
}
