//! Error types for schema declaration and record manipulation.
//!
//! Every failure that can be detected without touching storage is reported
//! through [`SchemaError`]: malformed identifiers, duplicate declarations,
//! unknown fields, values a field refuses, and records that cannot be
//! rendered into a statement.

use thiserror::Error;

/// Errors raised while declaring schemas or working with records.
///
/// The `Display` impl provides a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A schema or field name is not a plain SQL identifier.
    #[error("invalid identifier '{0}': must start with a letter or underscore and contain only alphanumerics and underscores")]
    InvalidIdentifier(String),

    /// A schema was declared without any field.
    #[error("schema {0} declares no fields")]
    EmptySchema(String),

    /// Two fields of the same schema share a name.
    #[error("duplicate field {field} in schema {schema}")]
    DuplicateField { schema: String, field: String },

    /// A second schema was registered under an existing name.
    #[error("schema {0} is already registered")]
    DuplicateSchema(String),

    /// More than one primary key, or a primary key not named `id`.
    #[error("invalid primary key in schema {schema}: {reason}")]
    InvalidPrimaryKey { schema: String, reason: String },

    /// The field is not declared by the schema.
    #[error("schema {schema} has no field {field}")]
    UnknownField { schema: String, field: String },

    /// No schema with this name is registered.
    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    /// A record was handed to the model of another schema.
    #[error("record of schema {found} used with model {expected}")]
    SchemaMismatch { expected: String, found: String },

    /// The field's validation rejected the value.
    #[error("value of type {value_type} is not valid for field {schema}.{field}")]
    InvalidValue {
        schema: String,
        field: String,
        value_type: &'static str,
    },

    /// The field is not a foreign key.
    #[error("field {schema}.{field} is not a reference")]
    NotAReference { schema: String, field: String },

    /// A reference was pointed at a record of the wrong schema.
    #[error("field {field} references {expected}, got a {found} record")]
    ReferenceMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// The record has no integer `id`, so it cannot be updated or referenced.
    #[error("record of schema {0} has no id")]
    MissingId(String),

    /// A storage row does not have one value per declared field.
    #[error("row for schema {schema} has {found} columns, expected {expected}")]
    RowShape {
        schema: String,
        expected: usize,
        found: usize,
    },
}

/// Convenience alias for results with [`SchemaError`].
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Checks that `name` can be interpolated as a bare SQL identifier.
pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SchemaError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(validate_identifier("User").is_ok());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier("post_2024").is_ok());
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2fast").is_err());
        assert!(validate_identifier("drop;--").is_err());
        assert!(validate_identifier("first name").is_err());
        assert!(validate_identifier("naïve").is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = SchemaError::UnknownField {
            schema: "User".into(),
            field: "email".into(),
        };
        assert_eq!(err.to_string(), "schema User has no field email");
        assert_eq!(
            SchemaError::MissingId("Post".into()).to_string(),
            "record of schema Post has no id"
        );
    }
}
