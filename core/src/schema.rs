//! Schema declaration and registration.
//!
//! A [`Schema`] is a named, ordered collection of [`FieldSpec`]s. Field order
//! is declaration order and drives the column order of `CREATE TABLE`,
//! `SELECT` and `INSERT`.
//!
//! Schemas are declared with a [`SchemaBuilder`], which assigns each field
//! its name and checks the declaration, and are then registered once into a
//! [`Registry`] at startup. Schemas may also be described declaratively with
//! [`SchemaDef`], e.g. in a YAML configuration file.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError, validate_identifier};
use crate::field::{FieldKind, FieldSpec};

/// Name of the field used to key updates and references.
pub const ID_FIELD: &str = "id";

/// A named, ordered collection of fields describing one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Starts declaring a schema called `name`.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.position(name).map(|idx| &self.fields[idx])
    }

    /// Position of the field in declaration order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldSpec::name)
    }

    pub fn primary_key(&self) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.is_primary_key())
    }

    /// Looks up `name` or reports it as an unknown field of this schema.
    pub(crate) fn require_field(&self, name: &str) -> Result<(usize, &FieldSpec)> {
        self.position(name)
            .map(|idx| (idx, &self.fields[idx]))
            .ok_or_else(|| SchemaError::UnknownField {
                schema: self.name.clone(),
                field: name.to_string(),
            })
    }
}

/// Builder for [`Schema`].
///
/// # Examples
///
/// ```
/// use yeti_core::{FieldSpec, Schema};
///
/// let user = Schema::builder("User")
///     .field("id", FieldSpec::primary_key().autoincrement())
///     .field("name", FieldSpec::text())
///     .field("age", FieldSpec::integer())
///     .build()
///     .unwrap();
///
/// let names: Vec<_> = user.field_names().collect();
/// assert_eq!(names, ["id", "name", "age"]);
///
/// // Duplicate field names are rejected.
/// assert!(Schema::builder("Bad")
///     .field("a", FieldSpec::text())
///     .field("a", FieldSpec::integer())
///     .build()
///     .is_err());
/// ```
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<(String, FieldSpec)>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Declares the next field under `name`.
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), spec));
        self
    }

    /// Assigns field names and checks the declaration.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::InvalidIdentifier`] for a schema or field name that
    ///   is not a plain identifier
    /// - [`SchemaError::EmptySchema`] when no field was declared
    /// - [`SchemaError::DuplicateField`] when a name is declared twice
    /// - [`SchemaError::InvalidPrimaryKey`] for a second primary key or one
    ///   not named `id`
    pub fn build(self) -> Result<Schema> {
        validate_identifier(&self.name)?;
        if self.fields.is_empty() {
            return Err(SchemaError::EmptySchema(self.name));
        }

        let mut fields: Vec<FieldSpec> = Vec::with_capacity(self.fields.len());
        for (name, mut spec) in self.fields {
            validate_identifier(&name)?;
            if fields.iter().any(|f| f.name() == name) {
                return Err(SchemaError::DuplicateField {
                    schema: self.name,
                    field: name,
                });
            }
            if spec.is_primary_key() {
                if name != ID_FIELD {
                    return Err(SchemaError::InvalidPrimaryKey {
                        schema: self.name,
                        reason: format!("primary key must be named {ID_FIELD}, found {name}"),
                    });
                }
                if fields.iter().any(FieldSpec::is_primary_key) {
                    return Err(SchemaError::InvalidPrimaryKey {
                        schema: self.name,
                        reason: "more than one primary key".to_string(),
                    });
                }
            }
            if let Some(target) = spec.references() {
                validate_identifier(target)?;
            }
            spec.assign_name(name);
            fields.push(spec);
        }

        Ok(Schema {
            name: self.name,
            fields,
        })
    }
}

/// Ordered set of registered schemas, keyed by name.
///
/// Registration order is preserved and drives table creation order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    schemas: Vec<Arc<Schema>>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `schema` and returns the shared handle to it.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateSchema`] if the name is taken.
    pub fn register(&mut self, schema: Schema) -> Result<Arc<Schema>> {
        if self.index.contains_key(schema.name()) {
            return Err(SchemaError::DuplicateSchema(schema.name().to_string()));
        }
        let schema = Arc::new(schema);
        self.index
            .insert(schema.name().to_string(), self.schemas.len());
        self.schemas.push(Arc::clone(&schema));
        Ok(schema)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.index.get(name).map(|&idx| &self.schemas[idx])
    }

    /// Like [`get`](Self::get), but reports a missing schema as an error.
    pub fn require(&self, name: &str) -> Result<&Arc<Schema>> {
        self.get(name)
            .ok_or_else(|| SchemaError::UnknownSchema(name.to_string()))
    }

    /// Schemas in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Schema>> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Declarative description of a schema.
///
/// # Examples
///
/// ```
/// use yeti_core::SchemaDef;
///
/// let yaml = r#"
/// name: Post
/// fields:
///   - { name: id, type: primary_key, autoincrement: true }
///   - { name: title, type: text, nullable: false }
///   - { name: author, type: foreign_key, references: User }
/// "#;
/// let def: SchemaDef = serde_yaml::from_str(yaml).unwrap();
/// let schema = def.into_builder().build().unwrap();
/// assert_eq!(schema.field("author").unwrap().references(), Some("User"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

/// Declarative description of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
}

fn default_nullable() -> bool {
    true
}

impl FieldDef {
    pub fn to_spec(&self) -> FieldSpec {
        let spec = FieldSpec::new(self.kind.clone()).nullable(self.nullable);
        if self.unique { spec.unique() } else { spec }
    }
}

impl SchemaDef {
    /// Converts the definition into a builder, keeping field order.
    pub fn into_builder(self) -> SchemaBuilder {
        self.fields
            .iter()
            .fold(SchemaBuilder::new(self.name), |builder, def| {
                builder.field(def.name.clone(), def.to_spec())
            })
    }
}
