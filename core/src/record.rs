//! Records: field values bound to a schema.
//!
//! A [`Record`] holds at most one value per declared field and tracks
//! whether it has been persisted. New records render an `INSERT` when
//! saved; persisted ones render an `UPDATE` keyed by their id.
//!
//! Foreign-key fields store the referenced record's raw id. Resolving the
//! referenced record is an explicit lookup performed by the storage layer.

use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::warn;

use crate::error::{Result, SchemaError};
use crate::field::FieldSpec;
use crate::schema::{ID_FIELD, Schema};
use crate::sql::{self, Statement};
use crate::value::Value;

/// Persistence state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordState {
    /// Constructed in memory, never saved.
    #[default]
    New,
    /// Loaded from storage or saved at least once.
    Persisted,
}

/// An instance of a schema.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use yeti_core::{FieldSpec, Record, Schema, Value};
///
/// let user = Arc::new(
///     Schema::builder("User")
///         .field("id", FieldSpec::primary_key().autoincrement())
///         .field("name", FieldSpec::text())
///         .field("age", FieldSpec::integer())
///         .build()
///         .unwrap(),
/// );
///
/// let ann = Record::new(user, [("name", Value::from("Ann")), ("age", Value::from(30))]);
/// assert!(ann.is_new());
/// assert_eq!(
///     ann.save_statement().unwrap().literal(),
///     "INSERT INTO User (name, age) VALUES ('Ann', 30);"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<Option<Value>>,
    state: RecordState,
    rejected: Vec<String>,
}

impl Record {
    /// Constructs a new record from `(field, value)` pairs.
    ///
    /// Pairs naming an undeclared field, or whose value the field does not
    /// accept, are dropped. Each drop is logged and listed by
    /// [`rejected`](Self::rejected).
    pub fn new<I, K, V>(schema: Arc<Schema>, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut record = Self::empty(schema);
        for (name, value) in values {
            let name = name.into();
            let value = value.into();
            match record.set(&name, value) {
                Ok(()) => {}
                Err(err) => {
                    warn!(schema = %record.schema.name(), field = %name, error = %err, "Dropping field value");
                    record.rejected.push(name);
                }
            }
        }
        record
    }

    /// Record with no assigned field.
    pub fn empty(schema: Arc<Schema>) -> Self {
        let values = vec![None; schema.fields().len()];
        Self {
            schema,
            values,
            state: RecordState::New,
            rejected: Vec::new(),
        }
    }

    /// Rebuilds a persisted record from a storage row.
    ///
    /// `row` holds one raw value per field, in declaration order. Each value
    /// goes through the field's decoding; no validation is applied.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::RowShape`] if the row width does not match the
    /// schema.
    pub fn from_storage(schema: Arc<Schema>, row: Vec<Value>) -> Result<Self> {
        if row.len() != schema.fields().len() {
            return Err(SchemaError::RowShape {
                schema: schema.name().to_string(),
                expected: schema.fields().len(),
                found: row.len(),
            });
        }
        let values = schema
            .fields()
            .iter()
            .zip(row)
            .map(|(spec, raw)| Some(spec.decode(raw)))
            .collect();
        Ok(Self {
            schema,
            values,
            state: RecordState::Persisted,
            rejected: Vec::new(),
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn state(&self) -> RecordState {
        self.state
    }

    pub fn is_new(&self) -> bool {
        self.state == RecordState::New
    }

    pub fn mark_persisted(&mut self) {
        self.state = RecordState::Persisted;
    }

    /// Names of the fields dropped at construction.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    /// Value of a declared field, `None` if undeclared or never assigned.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema
            .position(name)
            .and_then(|idx| self.values[idx].as_ref())
    }

    /// Assigns a declared field.
    ///
    /// `NULL` is always accepted by a nullable field, so a saved value can be
    /// cleared again.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownField`] if the schema does not declare `name`
    /// - [`SchemaError::InvalidValue`] if the field rejects the value
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let (idx, spec) = self.schema.require_field(name)?;
        let clears = value.is_null() && spec.is_nullable();
        if !clears && !spec.validate(&value) {
            return Err(SchemaError::InvalidValue {
                schema: self.schema.name().to_string(),
                field: name.to_string(),
                value_type: value.type_name(),
            });
        }
        self.values[idx] = Some(value);
        Ok(())
    }

    /// Points the foreign key `name` at `target` by storing its id.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownField`] / [`SchemaError::NotAReference`] if
    ///   `name` is not a declared foreign key
    /// - [`SchemaError::ReferenceMismatch`] if `target` belongs to another
    ///   schema than the one referenced
    /// - [`SchemaError::MissingId`] if `target` has no id yet
    pub fn set_reference(&mut self, name: &str, target: &Record) -> Result<()> {
        let (idx, spec) = self.schema.require_field(name)?;
        let Some(expected) = spec.references() else {
            return Err(SchemaError::NotAReference {
                schema: self.schema.name().to_string(),
                field: name.to_string(),
            });
        };
        if expected != target.schema.name() {
            return Err(SchemaError::ReferenceMismatch {
                field: name.to_string(),
                expected: expected.to_string(),
                found: target.schema.name().to_string(),
            });
        }
        let id = target
            .id()
            .ok_or_else(|| SchemaError::MissingId(target.schema.name().to_string()))?;
        self.values[idx] = Some(Value::Integer(id));
        Ok(())
    }

    /// Integer value of the `id` field, if any.
    pub fn id(&self) -> Option<i64> {
        self.get(ID_FIELD).and_then(Value::as_i64)
    }

    /// Assigned fields with their values, in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&FieldSpec, &Value)> {
        self.schema
            .fields()
            .iter()
            .zip(&self.values)
            .filter_map(|(spec, value)| value.as_ref().map(|v| (spec, v)))
    }

    /// Renders the statement that saves this record.
    ///
    /// `INSERT` of the assigned fields while new, `UPDATE ... WHERE id=<id>`
    /// once persisted.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingId`] for a persisted record without id.
    pub fn save_statement(&self) -> Result<Statement> {
        match self.state {
            RecordState::New => Ok(sql::insert(&self.schema, self.values())),
            RecordState::Persisted => {
                let id = self
                    .id()
                    .ok_or_else(|| SchemaError::MissingId(self.schema.name().to_string()))?;
                Ok(sql::update(&self.schema, self.values(), id))
            }
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.schema.name())?;
        for (i, (spec, value)) in self.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", spec.name(), spec.encode(value))?;
        }
        f.write_str("}")
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (spec, value) in self.values() {
            map.serialize_entry(spec.name(), value)?;
        }
        map.end()
    }
}
