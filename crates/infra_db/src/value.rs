//! Typed values, rows and named-parameter binding
//!
//! The capability layer speaks in [`DbValue`]s so that the PostgreSQL
//! adapter and the test double exchange the same shapes. Every variant is
//! nullable and keeps its SQL type when null, so a `NULL` timestamp is still
//! bound as a timestamp.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::DatabaseError;

/// A single SQL value with its type
#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
    Int(Option<i32>),
    BigInt(Option<i64>),
    Float(Option<f64>),
    Bool(Option<bool>),
    Text(Option<String>),
    Timestamp(Option<DateTime<Utc>>),
}

impl DbValue {
    pub fn is_null(&self) -> bool {
        match self {
            DbValue::Int(v) => v.is_none(),
            DbValue::BigInt(v) => v.is_none(),
            DbValue::Float(v) => v.is_none(),
            DbValue::Bool(v) => v.is_none(),
            DbValue::Text(v) => v.is_none(),
            DbValue::Timestamp(v) => v.is_none(),
        }
    }

    /// SQL type name, used in decode diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            DbValue::Int(_) => "int4",
            DbValue::BigInt(_) => "int8",
            DbValue::Float(_) => "float8",
            DbValue::Bool(_) => "bool",
            DbValue::Text(_) => "text",
            DbValue::Timestamp(_) => "timestamptz",
        }
    }
}

macro_rules! impl_into_db_value {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for DbValue {
            fn from(value: $ty) -> Self {
                DbValue::$variant(Some(value))
            }
        }

        impl From<Option<$ty>> for DbValue {
            fn from(value: Option<$ty>) -> Self {
                DbValue::$variant(value)
            }
        }
    };
}

impl_into_db_value!(i32, Int);
impl_into_db_value!(i64, BigInt);
impl_into_db_value!(f64, Float);
impl_into_db_value!(bool, Bool);
impl_into_db_value!(String, Text);
impl_into_db_value!(DateTime<Utc>, Timestamp);

impl From<&str> for DbValue {
    fn from(value: &str) -> Self {
        DbValue::Text(Some(value.to_string()))
    }
}

impl From<&String> for DbValue {
    fn from(value: &String) -> Self {
        DbValue::Text(Some(value.clone()))
    }
}

impl From<&Option<String>> for DbValue {
    fn from(value: &Option<String>) -> Self {
        DbValue::Text(value.clone())
    }
}

/// Errors raised while decoding a row into typed targets
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("expected {expected} columns, row has {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("column {index} out of range for a row of {width} columns")]
    ColumnOutOfRange { index: usize, width: usize },

    #[error("column {index} is NULL but the target is not optional")]
    UnexpectedNull { index: usize },

    #[error("column {index} holds {actual}, expected {expected}")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Conversion from a non-null [`DbValue`] into a Rust type
///
/// Implementations only see non-null values; nulls are handled by the
/// `Option<T>` blanket implementation and rejected for everything else.
pub trait FromDbValue: Sized {
    /// Type name reported in [`DecodeError::TypeMismatch`]
    const EXPECTED: &'static str;

    fn from_db_value(value: &DbValue) -> Option<Self>;

    fn decode_column(value: &DbValue, index: usize) -> Result<Self, DecodeError> {
        if value.is_null() {
            return Err(DecodeError::UnexpectedNull { index });
        }
        Self::from_db_value(value).ok_or(DecodeError::TypeMismatch {
            index,
            expected: Self::EXPECTED,
            actual: value.type_name(),
        })
    }
}

impl FromDbValue for i32 {
    const EXPECTED: &'static str = "int4";

    fn from_db_value(value: &DbValue) -> Option<Self> {
        match value {
            DbValue::Int(v) => *v,
            _ => None,
        }
    }
}

impl FromDbValue for i64 {
    const EXPECTED: &'static str = "int8";

    fn from_db_value(value: &DbValue) -> Option<Self> {
        match value {
            DbValue::BigInt(v) => *v,
            DbValue::Int(v) => v.map(i64::from),
            _ => None,
        }
    }
}

impl FromDbValue for f64 {
    const EXPECTED: &'static str = "float8";

    fn from_db_value(value: &DbValue) -> Option<Self> {
        match value {
            DbValue::Float(v) => *v,
            _ => None,
        }
    }
}

impl FromDbValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_db_value(value: &DbValue) -> Option<Self> {
        match value {
            DbValue::Bool(v) => *v,
            _ => None,
        }
    }
}

impl FromDbValue for String {
    const EXPECTED: &'static str = "text";

    fn from_db_value(value: &DbValue) -> Option<Self> {
        match value {
            DbValue::Text(v) => v.clone(),
            _ => None,
        }
    }
}

impl FromDbValue for DateTime<Utc> {
    const EXPECTED: &'static str = "timestamptz";

    fn from_db_value(value: &DbValue) -> Option<Self> {
        match value {
            DbValue::Timestamp(v) => *v,
            _ => None,
        }
    }
}

impl<T: FromDbValue> FromDbValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_db_value(value: &DbValue) -> Option<Self> {
        T::from_db_value(value).map(Some)
    }

    fn decode_column(value: &DbValue, index: usize) -> Result<Self, DecodeError> {
        if !value.is_null() {
            return T::decode_column(value, index).map(Some);
        }
        // A typed null must still be of the target's type
        let widened = T::EXPECTED == "int8" && matches!(value, DbValue::Int(_));
        if T::EXPECTED == value.type_name() || widened {
            Ok(None)
        } else {
            Err(DecodeError::TypeMismatch {
                index,
                expected: T::EXPECTED,
                actual: value.type_name(),
            })
        }
    }
}

/// Types decodable from a whole row
pub trait FromDbRow: Sized {
    fn from_db_row(row: &DbRow) -> Result<Self, DecodeError>;
}

/// A fetched row, decoded strictly by position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbRow {
    values: Vec<DbValue>,
}

impl DbRow {
    pub fn new(values: Vec<DbValue>) -> Self {
        Self { values }
    }

    pub fn width(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[DbValue] {
        &self.values
    }

    /// Decodes the column at `index`
    ///
    /// # Errors
    ///
    /// Returns `ColumnOutOfRange`, `UnexpectedNull` or `TypeMismatch`
    pub fn get<T: FromDbValue>(&self, index: usize) -> Result<T, DecodeError> {
        let value = self.values.get(index).ok_or(DecodeError::ColumnOutOfRange {
            index,
            width: self.values.len(),
        })?;
        T::decode_column(value, index)
    }

    /// Fails unless the row has exactly `expected` columns
    pub fn expect_width(&self, expected: usize) -> Result<(), DecodeError> {
        if self.values.len() != expected {
            return Err(DecodeError::WidthMismatch {
                expected,
                actual: self.values.len(),
            });
        }
        Ok(())
    }

    /// Decodes the whole row into `T`
    pub fn decode<T: FromDbRow>(&self) -> Result<T, DecodeError> {
        T::from_db_row(self)
    }

    /// Decodes a single-column row, e.g. a `RETURNING id` or `COUNT(*)`
    pub fn decode_scalar<T: FromDbValue>(&self) -> Result<T, DecodeError> {
        self.expect_width(1)?;
        self.get(0)
    }
}

/// Named query arguments, referenced as `@name` in query text
///
/// Binding by name decouples the binding order from the column order. The
/// PostgreSQL adapter compiles the names into `$n` placeholders with
/// [`NamedArgs::compile`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedArgs {
    args: BTreeMap<String, DbValue>,
}

impl NamedArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an argument
    pub fn with(mut self, name: impl Into<String>, value: impl Into<DbValue>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&DbValue> {
        self.args.get(name)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.args.keys().map(String::as_str)
    }

    /// Rewrites `@name` references into `$n` placeholders
    ///
    /// Placeholders are numbered by first appearance; a name used twice
    /// binds once. Quoted literals and identifiers, `--` and `/* */`
    /// comments, dollar-quoted bodies, and `@` not followed by an
    /// identifier (such as the `@>` operator) are left untouched.
    ///
    /// # Returns
    ///
    /// The rewritten SQL and the values in placeholder order
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::UnboundParameter` if the query references a
    /// name with no argument
    pub fn compile(&self, query: &str) -> Result<(String, Vec<DbValue>), DatabaseError> {
        let mut sql = String::with_capacity(query.len());
        let mut order: Vec<&str> = Vec::new();
        let mut rest = query;

        while let Some(c) = rest.chars().next() {
            let verbatim = opaque_len(rest);
            if verbatim > 0 {
                sql.push_str(&rest[..verbatim]);
                rest = &rest[verbatim..];
                continue;
            }

            if c == '@' {
                let tail = &rest[1..];
                let name_len = tail.find(|n: char| !is_name_char(n)).unwrap_or(tail.len());
                let name = &tail[..name_len];

                if name.starts_with(is_name_start) {
                    if !self.args.contains_key(name) {
                        return Err(DatabaseError::UnboundParameter(name.to_string()));
                    }
                    let position = match order.iter().position(|seen| *seen == name) {
                        Some(position) => position,
                        None => {
                            order.push(name);
                            order.len() - 1
                        }
                    };
                    sql.push('$');
                    sql.push_str(&(position + 1).to_string());
                    rest = &tail[name_len..];
                    continue;
                }
            }

            sql.push(c);
            rest = &rest[c.len_utf8()..];
        }

        let values = order
            .into_iter()
            .map(|name| self.args[name].clone())
            .collect();
        Ok((sql, values))
    }
}

/// Length of the quoted region or comment at the start of `sql`, or 0
///
/// An unterminated region runs to the end of the text.
fn opaque_len(sql: &str) -> usize {
    let closed_by = |open: usize, close: &str| {
        sql[open..]
            .find(close)
            .map_or(sql.len(), |i| open + i + close.len())
    };

    if sql.starts_with('\'') {
        closed_by(1, "'")
    } else if sql.starts_with('"') {
        closed_by(1, "\"")
    } else if sql.starts_with("--") {
        sql.find('\n').unwrap_or(sql.len())
    } else if sql.starts_with("/*") {
        closed_by(2, "*/")
    } else if let Some(tail) = sql.strip_prefix('$') {
        // $$ or $tag$; $1 is a placeholder
        let tag_len = tail.find(|n: char| !is_name_char(n)).unwrap_or(tail.len());
        let tag = &tail[..tag_len];
        if tag.starts_with(|n: char| n.is_ascii_digit()) || !tail[tag_len..].starts_with('$') {
            return 0;
        }
        let delimiter = &sql[..tag_len + 2];
        closed_by(delimiter.len(), delimiter)
    } else {
        0
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl fmt::Display for NamedArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.names().collect();
        write!(f, "[{}]", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_compile_numbers_by_first_appearance() {
        let args = NamedArgs::new().with("id", 4).with("name", "Marsh");
        let (sql, values) = args
            .compile("UPDATE locations SET name = @name WHERE id = @id")
            .unwrap();

        assert_eq!(sql, "UPDATE locations SET name = $1 WHERE id = $2");
        assert_eq!(values, vec![DbValue::from("Marsh"), DbValue::Int(Some(4))]);
    }

    #[test]
    fn test_compile_reuses_repeated_names() {
        let args = NamedArgs::new().with("x", 1);
        let (sql, values) = args.compile("SELECT @x + @x").unwrap();

        assert_eq!(sql, "SELECT $1 + $1");
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_compile_skips_literals_casts_and_operators() {
        let args = NamedArgs::new().with("lon", "1.00");
        let (sql, _) = args
            .compile("SELECT 'me@home', tags @> '{a}', @lon::text::double precision")
            .unwrap();

        assert_eq!(
            sql,
            "SELECT 'me@home', tags @> '{a}', $1::text::double precision"
        );
    }

    #[test]
    fn test_compile_leaves_comments_identifiers_and_bodies_alone() {
        let args = NamedArgs::new().with("id", 7);
        let query = concat!(
            "SELECT \"user@host\" -- filtered by @owner\n",
            "FROM t /* @skipped */ WHERE id = @id AND body = $$ @inside $$ ",
            "AND note = $fn$ @tagged $fn$ LIMIT $1"
        );

        let (sql, values) = args.compile(query).unwrap();

        assert_eq!(sql, query.replace("@id", "$1"));
        assert_eq!(values, vec![DbValue::Int(Some(7))]);
    }

    #[test]
    fn test_compile_handles_escaped_quotes() {
        let args = NamedArgs::new().with("name", "Fen");
        let (sql, _) = args
            .compile("SELECT 'it''s @not' || @name")
            .unwrap();

        assert_eq!(sql, "SELECT 'it''s @not' || $1");
    }

    #[test]
    fn test_compile_rejects_unbound_names() {
        let args = NamedArgs::new().with("file_size", 1.0);
        let err = args.compile("VALUES (@file_Size)").unwrap_err();

        assert_eq!(err, DatabaseError::UnboundParameter("file_Size".to_string()));
    }

    #[test]
    fn test_optional_decodes_typed_null() {
        let row = DbRow::new(vec![DbValue::Text(None), DbValue::Timestamp(None)]);

        assert_eq!(row.get::<Option<String>>(0).unwrap(), None);
        assert_eq!(row.get::<Option<DateTime<Utc>>>(1).unwrap(), None);
    }

    #[test]
    fn test_required_rejects_null() {
        let row = DbRow::new(vec![DbValue::Text(None)]);
        assert_eq!(
            row.get::<String>(0).unwrap_err(),
            DecodeError::UnexpectedNull { index: 0 }
        );
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let row = DbRow::new(vec![DbValue::Text(Some("2".to_string()))]);
        assert_eq!(
            row.get::<i32>(0).unwrap_err(),
            DecodeError::TypeMismatch {
                index: 0,
                expected: "int4",
                actual: "text"
            }
        );
        assert!(row.get::<Option<i32>>(0).is_err());
        assert!(row.get::<Option<DateTime<Utc>>>(0).is_err());
    }

    #[test]
    fn test_out_of_range_column() {
        let row = DbRow::new(vec![DbValue::Int(Some(1))]);
        assert_eq!(
            row.get::<i32>(3).unwrap_err(),
            DecodeError::ColumnOutOfRange { index: 3, width: 1 }
        );
    }

    #[test]
    fn test_scalar_widens_int4_for_count() {
        let row = DbRow::new(vec![DbValue::Int(Some(12))]);
        assert_eq!(row.decode_scalar::<i64>().unwrap(), 12);
    }

    proptest! {
        #[test]
        fn prop_every_distinct_name_gets_one_placeholder(
            names in proptest::collection::btree_set("[a-z_][a-z0-9_]{0,8}", 1..6)
        ) {
            let mut args = NamedArgs::new();
            let mut query = String::from("SELECT");
            for (i, name) in names.iter().enumerate() {
                args = args.with(name.clone(), i as i64);
                query.push_str(&format!(" @{name}, @{name},"));
            }

            let (sql, values) = args.compile(&query).unwrap();

            prop_assert_eq!(values.len(), names.len());
            prop_assert!(!sql.contains('@'));
            for n in 1..=names.len() {
                let placeholder = format!("${},", n);
                prop_assert_eq!(sql.matches(placeholder.as_str()).count(), 2);
            }
        }
    }
}
