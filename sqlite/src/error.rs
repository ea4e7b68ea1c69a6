//! Error types for storage operations.
//!
//! Provides a unified error type covering database access, schema and
//! record errors, value conversion and configuration loading.

use thiserror::Error;
use yeti_core::SchemaError;

/// Errors that can occur while talking to the database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLite operation failure.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Schema declaration or record error.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A database operation was attempted before any database was opened.
    #[error("database not set: open a database before using the models")]
    DatabaseNotSet,

    /// A stored value has no [`Value`](yeti_core::Value) counterpart.
    #[error("conversion error: {0}")]
    ConversionError(String),

    /// Configuration file could not be read or written.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration file could not be parsed or serialized.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl DatabaseError {
    /// Returns `true` when the store refused a write because of the data:
    /// unique, not-null and other constraint failures, and datatype
    /// mismatches such as text stored into an `INTEGER PRIMARY KEY`.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(err, _))
                if matches!(
                    err.code,
                    rusqlite::ErrorCode::ConstraintViolation | rusqlite::ErrorCode::TypeMismatch
                )
        )
    }
}

/// Convenience alias for results with [`DatabaseError`].
pub type Result<T> = std::result::Result<T, DatabaseError>;
