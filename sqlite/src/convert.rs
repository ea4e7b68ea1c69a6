//! Conversion between [`Value`] and SQLite values.

use rusqlite::types::{Value as SqlValue, ValueRef};
use yeti_core::Value;

use crate::error::{DatabaseError, Result};

/// Converts a bound parameter into an owned SQLite value.
pub(crate) fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Integer(*v),
        Value::Real(v) => SqlValue::Real(*v),
        Value::Text(v) => SqlValue::Text(v.clone()),
    }
}

/// Converts a column read from a row into a [`Value`].
///
/// # Errors
///
/// Returns [`DatabaseError::ConversionError`] for blobs and for text that is
/// not valid UTF-8.
pub(crate) fn from_sql(raw: ValueRef<'_>) -> Result<Value> {
    match raw {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(v) => Ok(Value::Integer(v)),
        ValueRef::Real(v) => Ok(Value::Real(v)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| Value::Text(s.to_string()))
            .map_err(|e| DatabaseError::ConversionError(format!("invalid UTF-8 text: {e}"))),
        ValueRef::Blob(_) => Err(DatabaseError::ConversionError(
            "blob columns are not supported".to_string(),
        )),
    }
}
