//! Scanned rows and the decoding rules used by the entity materializer.
//!
//! # Architecture
//!
//! ```text
//! driver        → Rows { columns, rows: Vec<Row> }
//! materializer  → RowReader walks Row positionally against the entity's ColumnSpec list
//! reduced views → FromRow decodes a whole row into a scalar or a tuple
//! ```
//!
//! Identifiers are stored as integers and exposed as their canonical decimal
//! string ([`format_id`]); [`parse_id`] is its exact inverse for every `i64`.

use core::fmt;

use crate::error::{EntError, Result};
use crate::schema::ColumnSpec;
use crate::value::Value;

// =============================================================================
// Row / Rows
// =============================================================================

/// One positional result row.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    #[inline]
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[inline]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

/// Result set returned by a driver: column names plus rows in store order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rows {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Rows {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl IntoIterator for Rows {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

// =============================================================================
// FromValue: single column decoding
// =============================================================================

/// Why a value could not be decoded into the requested type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl DecodeError {
    pub const fn new(expected: &'static str, found: &Value) -> Self {
        Self {
            expected,
            found: found.kind(),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, found {}", self.expected, self.found)
    }
}

/// Decodes one column value.
///
/// `NULLABLE` is true only for types with an "absent" representation
/// (`Option<T>`, [`Value`]); the materializer rejects NULL for the rest.
pub trait FromValue: Sized {
    const NULLABLE: bool = false;

    fn from_value(value: &Value) -> core::result::Result<Self, DecodeError>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> core::result::Result<Self, DecodeError> {
        value
            .as_integer()
            .ok_or_else(|| DecodeError::new("integer", value))
    }
}

macro_rules! impl_from_value_narrow_int {
    ($($ty:ty),*) => { $(
        impl FromValue for $ty {
            fn from_value(value: &Value) -> core::result::Result<Self, DecodeError> {
                let wide = i64::from_value(value)?;
                <$ty>::try_from(wide).map_err(|_| DecodeError {
                    expected: stringify!($ty),
                    found: "out of range integer",
                })
            }
        }
    )* }
}

impl_from_value_narrow_int!(i8, i16, i32, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> core::result::Result<Self, DecodeError> {
        match value {
            Value::Real(r) => Ok(*r),
            // Aggregates over integer columns come back as integers.
            Value::Integer(i) => Ok(*i as f64),
            other => Err(DecodeError::new("real", other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> core::result::Result<Self, DecodeError> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> core::result::Result<Self, DecodeError> {
        match value {
            Value::Integer(i) => Ok(*i != 0),
            other => Err(DecodeError::new("boolean", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> core::result::Result<Self, DecodeError> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(DecodeError::new("text", other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> core::result::Result<Self, DecodeError> {
        match value {
            Value::Blob(b) => Ok(b.clone()),
            Value::Text(s) => Ok(s.as_bytes().to_vec()),
            other => Err(DecodeError::new("blob", other)),
        }
    }
}

impl FromValue for Value {
    const NULLABLE: bool = true;

    fn from_value(value: &Value) -> core::result::Result<Self, DecodeError> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const NULLABLE: bool = true;

    fn from_value(value: &Value) -> core::result::Result<Self, DecodeError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

// =============================================================================
// Identifiers
// =============================================================================

/// Canonical string form of a numeric identifier.
#[inline]
pub fn format_id(raw: i64) -> String {
    raw.to_string()
}

/// Parses an identifier previously produced by [`format_id`].
pub fn parse_id(id: &str) -> Result<i64> {
    id.parse::<i64>()
        .map_err(|_| EntError::invalid(format!("malformed identifier {id:?}")))
}

/// Normalizes a key column (primary, foreign or join-table key) to the
/// identifier string. Drivers may hand keys back as integers or as numeric text.
pub fn decode_id(value: &Value) -> core::result::Result<String, DecodeError> {
    match value {
        Value::Integer(i) => Ok(format_id(*i)),
        Value::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(format_id)
            .map_err(|_| DecodeError::new("numeric identifier", value)),
        other => Err(DecodeError::new("numeric identifier", other)),
    }
}

// =============================================================================
// RowReader: positional entity materialization
// =============================================================================

/// Walks a row left to right against an entity's declared columns.
///
/// Entities implement their `from_row` by calling [`RowReader::id`] and
/// [`RowReader::next`] once per declared column, in declaration order.
#[derive(Debug)]
pub struct RowReader<'r> {
    label: &'static str,
    columns: &'static [ColumnSpec],
    row: &'r Row,
    pos: usize,
}

impl<'r> RowReader<'r> {
    pub fn new(label: &'static str, columns: &'static [ColumnSpec], row: &'r Row) -> Self {
        Self {
            label,
            columns,
            row,
            pos: 0,
        }
    }

    /// Index of the next column to be read.
    #[inline]
    pub const fn position(&self) -> usize {
        self.pos
    }

    fn advance(&mut self) -> Result<(&'static ColumnSpec, &'r Value)> {
        let Some(spec) = self.columns.get(self.pos) else {
            return Err(EntError::mismatch(format!(
                "{}: read past the {} declared columns",
                self.label,
                self.columns.len()
            )));
        };
        let Some(value) = self.row.get(self.pos) else {
            return Err(EntError::mismatch(format!(
                "{}: row has {} values, column {:?} is missing",
                self.label,
                self.row.len(),
                spec.name
            )));
        };
        self.pos += 1;
        Ok((spec, value))
    }

    /// Reads the next column as an identifier.
    pub fn id(&mut self) -> Result<String> {
        let (spec, value) = self.advance()?;
        decode_id(value).map_err(|err| self.column_error(spec, &err))
    }

    /// Reads the next column with `T`'s decoding rule.
    pub fn next<T: FromValue>(&mut self) -> Result<T> {
        let (spec, value) = self.advance()?;
        if spec.nullable != T::NULLABLE {
            return Err(EntError::mismatch(format!(
                "{}.{}: column nullability ({}) disagrees with field type",
                self.label,
                spec.name,
                if spec.nullable { "nullable" } else { "not null" }
            )));
        }
        if value.is_null() && !T::NULLABLE {
            return Err(EntError::mismatch(format!(
                "{}.{}: unexpected NULL",
                self.label, spec.name
            )));
        }
        T::from_value(value).map_err(|err| self.column_error(spec, &err))
    }

    /// Verifies every declared column was consumed.
    pub fn finish(self) -> Result<()> {
        if self.pos != self.columns.len() {
            return Err(EntError::mismatch(format!(
                "{}: read {} of {} declared columns",
                self.label,
                self.pos,
                self.columns.len()
            )));
        }
        Ok(())
    }

    fn column_error(&self, spec: &ColumnSpec, err: &DecodeError) -> EntError {
        EntError::mismatch(format!("{}.{}: {err}", self.label, spec.name))
    }
}

// =============================================================================
// FromRow: whole-row scanning for reduced views
// =============================================================================

/// Decodes a full row; `WIDTH` is the number of columns consumed.
pub trait FromRow: Sized {
    const WIDTH: usize;

    fn from_row(row: &Row) -> Result<Self>;
}

fn column_at<T: FromValue>(row: &Row, index: usize) -> Result<T> {
    let value = row
        .get(index)
        .ok_or_else(|| EntError::mismatch(format!("row has no column {index}")))?;
    T::from_value(value).map_err(|err| EntError::mismatch(format!("column {index}: {err}")))
}

macro_rules! impl_from_row_scalar {
    ($($ty:ty),*) => { $(
        impl FromRow for $ty {
            const WIDTH: usize = 1;

            fn from_row(row: &Row) -> Result<Self> {
                column_at(row, 0)
            }
        }

        impl FromRow for Option<$ty> {
            const WIDTH: usize = 1;

            fn from_row(row: &Row) -> Result<Self> {
                column_at(row, 0)
            }
        }
    )* }
}

impl_from_row_scalar!(i64, i32, u32, u64, usize, f64, f32, bool, String, Vec<u8>);

macro_rules! impl_from_row_tuple {
    ($width:expr; $($T:ident => $idx:tt),+) => {
        impl<$($T: FromValue),+> FromRow for ($($T,)+) {
            const WIDTH: usize = $width;

            fn from_row(row: &Row) -> Result<Self> {
                Ok(($(column_at::<$T>(row, $idx)?,)+))
            }
        }
    };
}

impl_from_row_tuple!(1; A => 0);
impl_from_row_tuple!(2; A => 0, B => 1);
impl_from_row_tuple!(3; A => 0, B => 1, C => 2);
impl_from_row_tuple!(4; A => 0, B => 1, C => 2, D => 3);
impl_from_row_tuple!(5; A => 0, B => 1, C => 2, D => 3, E => 4);
impl_from_row_tuple!(6; A => 0, B => 1, C => 2, D => 3, E => 4, F => 5);

#[cfg(test)]
mod tests {
    use super::*;

    static COLUMNS: &[ColumnSpec] = &[
        ColumnSpec::new("id"),
        ColumnSpec::new("name"),
        ColumnSpec::nullable("external_id"),
    ];

    #[test]
    fn id_formatting_round_trips() {
        for raw in [0_i64, 1, 7, 42, 1 << 31, i64::from(u32::MAX), i64::MAX] {
            assert_eq!(parse_id(&format_id(raw)).unwrap(), raw);
        }
        assert!(parse_id("12a").is_err());
        assert!(parse_id("").is_err());
    }

    #[test]
    fn decode_id_normalizes_numeric_text() {
        assert_eq!(decode_id(&Value::Integer(12)).unwrap(), "12");
        assert_eq!(decode_id(&Value::Text("0012".into())).unwrap(), "12");
        assert!(decode_id(&Value::Null).is_err());
        assert!(decode_id(&Value::Real(1.5)).is_err());
    }

    #[test]
    fn reader_decodes_declared_columns() {
        let row = Row::new(vec![Value::Integer(3), "fiber".into(), Value::Null]);
        let mut reader = RowReader::new("service", COLUMNS, &row);
        assert_eq!(reader.id().unwrap(), "3");
        assert_eq!(reader.next::<String>().unwrap(), "fiber");
        assert_eq!(reader.next::<Option<String>>().unwrap(), None);
        reader.finish().unwrap();
    }

    #[test]
    fn reader_rejects_null_in_required_column() {
        let row = Row::new(vec![Value::Integer(3), Value::Null, Value::Null]);
        let mut reader = RowReader::new("service", COLUMNS, &row);
        reader.id().unwrap();
        let err = reader.next::<String>().unwrap_err();
        assert!(matches!(err, EntError::SchemaMismatch(_)), "{err}");
    }

    #[test]
    fn reader_rejects_short_rows_and_unread_columns() {
        let row = Row::new(vec![Value::Integer(3)]);
        let mut reader = RowReader::new("service", COLUMNS, &row);
        reader.id().unwrap();
        assert!(matches!(
            reader.next::<String>(),
            Err(EntError::SchemaMismatch(_))
        ));

        let row = Row::new(vec![Value::Integer(3), "a".into(), Value::Null]);
        let mut reader = RowReader::new("service", COLUMNS, &row);
        reader.id().unwrap();
        assert!(reader.finish().is_err());
    }

    #[test]
    fn reader_rejects_type_mismatch() {
        let row = Row::new(vec![Value::Integer(3), Value::Integer(9), Value::Null]);
        let mut reader = RowReader::new("service", COLUMNS, &row);
        reader.id().unwrap();
        let err = reader.next::<String>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "schema mismatch: service.name: expected text, found integer"
        );
    }

    #[test]
    fn tuples_scan_by_position() {
        let row = Row::new(vec!["a".into(), Value::Integer(2), Value::Real(0.5)]);
        let (name, count, ratio) = <(String, i64, f64)>::from_row(&row).unwrap();
        assert_eq!((name.as_str(), count, ratio), ("a", 2, 0.5));
        assert_eq!(<(String, i64, f64)>::WIDTH, 3);
        assert_eq!(<String as FromRow>::WIDTH, 1);
    }
}
