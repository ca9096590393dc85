//! SQL dialects understood by the statement renderer.

use core::fmt::Write;

/// SQL dialect for database-specific rendering
///
/// Each dialect has different placeholder syntax and identifier quoting.
/// Only SQLite ships with a driver; the others render statements for
/// drivers implemented outside this workspace.
///
/// # Examples
///
/// ```
/// use entwine_core::Dialect;
///
/// let dialect = Dialect::PostgreSQL;
/// assert!(dialect.uses_numbered_placeholders());
///
/// let sqlite = Dialect::SQLite;
/// assert!(!sqlite.uses_numbered_placeholders());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Dialect {
    /// SQLite - uses `?` positional placeholders and `"ident"` quoting
    #[default]
    SQLite,

    /// PostgreSQL - uses `$1, $2, ...` numbered placeholders
    PostgreSQL,

    /// MySQL - uses `?` positional placeholders and `` `ident` `` quoting
    MySQL,
}

impl Dialect {
    /// Largest LIMIT rendered when an OFFSET is given without one.
    pub const MAX_LIMIT: u64 = i32::MAX as u64;

    /// Returns `true` if this dialect uses numbered placeholders (`$1, $2, ...`)
    #[inline]
    #[must_use]
    pub const fn uses_numbered_placeholders(&self) -> bool {
        matches!(self, Dialect::PostgreSQL)
    }

    /// Character used to quote identifiers.
    #[inline]
    #[must_use]
    pub const fn quote_char(&self) -> char {
        match self {
            Dialect::SQLite | Dialect::PostgreSQL => '"',
            Dialect::MySQL => '`',
        }
    }

    /// Writes the placeholder for the 1-based parameter `index`.
    pub fn write_placeholder(&self, index: usize, buf: &mut impl Write) {
        match self {
            Dialect::PostgreSQL => {
                let _ = write!(buf, "${index}");
            }
            Dialect::SQLite | Dialect::MySQL => {
                let _ = buf.write_char('?');
            }
        }
    }

    /// Writes `name` as a quoted identifier, doubling embedded quote characters.
    pub fn write_ident(&self, name: &str, buf: &mut impl Write) {
        let quote = self.quote_char();
        let _ = buf.write_char(quote);
        for ch in name.chars() {
            if ch == quote {
                let _ = buf.write_char(quote);
            }
            let _ = buf.write_char(ch);
        }
        let _ = buf.write_char(quote);
    }

    /// Parse a dialect from a string (case-insensitive)
    ///
    /// Supports various common aliases:
    /// - SQLite: `"sqlite"`, `"sqlite3"`
    /// - PostgreSQL: `"postgresql"`, `"postgres"`, `"pg"`
    /// - MySQL: `"mysql"`
    ///
    /// # Examples
    ///
    /// ```
    /// use entwine_core::Dialect;
    ///
    /// assert_eq!(Dialect::parse("sqlite"), Some(Dialect::SQLite));
    /// assert_eq!(Dialect::parse("pg"), Some(Dialect::PostgreSQL));
    /// assert_eq!(Dialect::parse("unknown"), None);
    /// ```
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("sqlite") || s.eq_ignore_ascii_case("sqlite3") {
            Some(Dialect::SQLite)
        } else if s.eq_ignore_ascii_case("postgresql")
            || s.eq_ignore_ascii_case("postgres")
            || s.eq_ignore_ascii_case("pg")
        {
            Some(Dialect::PostgreSQL)
        } else if s.eq_ignore_ascii_case("mysql") {
            Some(Dialect::MySQL)
        } else {
            None
        }
    }

    /// Get the dialect name as a lowercase string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Dialect::SQLite => "sqlite",
            Dialect::PostgreSQL => "postgresql",
            Dialect::MySQL => "mysql",
        }
    }
}

impl core::fmt::Display for Dialect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Dialect {
    type Err = DialectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dialect::parse(s).ok_or(DialectParseError)
    }
}

/// Error returned when parsing an unknown dialect string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectParseError;

impl core::fmt::Display for DialectParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("unknown dialect")
    }
}

impl std::error::Error for DialectParseError {}
