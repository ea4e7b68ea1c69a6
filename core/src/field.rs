//! Column descriptors.
//!
//! A [`FieldSpec`] describes one column of a schema: its storage type,
//! nullability and uniqueness, how values are rendered as SQL literals and
//! which values it accepts. The variant-specific part lives in [`FieldKind`].

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Storage variant of a field.
///
/// # Examples
///
/// ```
/// use yeti_core::FieldKind;
///
/// let kind: FieldKind = serde_yaml::from_str("type: foreign_key\nreferences: User").unwrap();
/// assert_eq!(kind, FieldKind::ForeignKey { references: "User".into() });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// `TEXT` column; values must be text.
    Text,
    /// `INTEGER` column.
    Integer,
    /// `REAL` column.
    Real,
    /// `INTEGER PRIMARY KEY`, an alias of the row id.
    PrimaryKey {
        #[serde(default)]
        autoincrement: bool,
    },
    /// `INTEGER` column holding the id of a record of another schema.
    ForeignKey { references: String },
}

impl FieldKind {
    /// SQL type name emitted in `CREATE TABLE`.
    pub fn sql_type_name(&self) -> &'static str {
        match self {
            FieldKind::Text => "TEXT",
            FieldKind::Integer | FieldKind::ForeignKey { .. } => "INTEGER",
            FieldKind::Real => "REAL",
            FieldKind::PrimaryKey { .. } => "INTEGER PRIMARY KEY",
        }
    }
}

/// Descriptor of a single column.
///
/// Built with one of the kind constructors and chained modifiers; the name is
/// assigned when the field is added to a [`SchemaBuilder`](crate::SchemaBuilder).
///
/// # Examples
///
/// ```
/// use yeti_core::{FieldSpec, Schema, Value};
///
/// let schema = Schema::builder("User")
///     .field("id", FieldSpec::primary_key().autoincrement())
///     .field("name", FieldSpec::text().not_null().unique())
///     .build()
///     .unwrap();
///
/// let name = schema.field("name").unwrap();
/// assert_eq!(name.column_definition(), "name TEXT NOT NULL UNIQUE");
/// assert_eq!(name.encode(&Value::from("O'Brien")), "'O''Brien'");
/// assert!(!name.validate(&Value::from(3)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    nullable: bool,
    unique: bool,
}

impl FieldSpec {
    /// Creates an unnamed, nullable, non-unique field of the given kind.
    pub fn new(kind: FieldKind) -> Self {
        Self {
            name: String::new(),
            kind,
            nullable: true,
            unique: false,
        }
    }

    pub fn text() -> Self {
        Self::new(FieldKind::Text)
    }

    pub fn integer() -> Self {
        Self::new(FieldKind::Integer)
    }

    pub fn real() -> Self {
        Self::new(FieldKind::Real)
    }

    /// Primary key without `AUTOINCREMENT`.
    pub fn primary_key() -> Self {
        Self::new(FieldKind::PrimaryKey {
            autoincrement: false,
        })
    }

    /// Reference to a record of the schema named `references`.
    pub fn foreign_key(references: impl Into<String>) -> Self {
        Self::new(FieldKind::ForeignKey {
            references: references.into(),
        })
    }

    /// Adds `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Adds `UNIQUE`.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Adds `AUTOINCREMENT`. Has no effect on kinds other than primary keys.
    pub fn autoincrement(mut self) -> Self {
        if let FieldKind::PrimaryKey { autoincrement } = &mut self.kind {
            *autoincrement = true;
        }
        self
    }

    /// Column name. Empty until the field is added to a schema.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_primary_key(&self) -> bool {
        matches!(self.kind, FieldKind::PrimaryKey { .. })
    }

    /// Name of the referenced schema for foreign keys.
    pub fn references(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::ForeignKey { references } => Some(references),
            _ => None,
        }
    }

    pub fn sql_type_name(&self) -> &'static str {
        self.kind.sql_type_name()
    }

    pub(crate) fn assign_name(&mut self, name: String) {
        debug_assert!(self.name.is_empty(), "field name assigned twice");
        self.name = name;
    }

    /// Returns `true` if the field accepts `value`.
    ///
    /// Text fields require a text value; every other kind accepts anything.
    pub fn validate(&self, value: &Value) -> bool {
        match self.kind {
            FieldKind::Text => matches!(value, Value::Text(_)),
            _ => true,
        }
    }

    /// Renders `value` as an SQL literal.
    ///
    /// Text is single-quoted with embedded quotes doubled; a text field
    /// quotes whatever it is given. Other kinds render the value's natural
    /// literal, `NULL` included.
    pub fn encode(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Text(text) => quote(text),
            other if self.kind == FieldKind::Text => quote(&other.to_string()),
            other => other.to_string(),
        }
    }

    /// Converts a raw storage value into the field's value.
    ///
    /// Values are returned unchanged. Foreign keys keep the raw id; the
    /// referenced record is only looked up on explicit request.
    pub fn decode(&self, raw: Value) -> Value {
        raw
    }

    /// Renders `<name> <TYPE> [AUTOINCREMENT] [NOT NULL] [UNIQUE]`.
    pub fn column_definition(&self) -> String {
        let mut def = format!("{} {}", self.name, self.sql_type_name());
        if let FieldKind::PrimaryKey {
            autoincrement: true,
        } = self.kind
        {
            def.push_str(" AUTOINCREMENT");
        }
        if !self.nullable {
            def.push_str(" NOT NULL");
        }
        if self.unique {
            def.push_str(" UNIQUE");
        }
        def
    }
}

/// Quotes `text` as an SQL string literal.
pub(crate) fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
