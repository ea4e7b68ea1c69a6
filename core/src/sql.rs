//! SQL statement generation.
//!
//! Statements are generated from a [`Schema`] and field values. Each
//! [`Statement`] carries the parameterized SQL that is executed (numbered
//! `?N` placeholders plus bound values) and a literal rendering built with
//! [`FieldSpec::encode`](crate::FieldSpec::encode), used for logging.
//!
//! Column order always follows the schema's declaration order.
//!
//! # Statement shapes
//!
//! - `CREATE TABLE [IF NOT EXISTS] T (<column definitions>);`
//! - `SELECT c1, c2 FROM T [WHERE a=? AND b=?];`
//! - `INSERT INTO T (c1, c2) VALUES (?, ?);`
//! - `UPDATE T SET c1=?, c2=? WHERE id=?;`

use std::fmt;

use crate::error::Result;
use crate::field::FieldSpec;
use crate::schema::{ID_FIELD, Schema};
use crate::value::Value;

/// A generated statement.
///
/// # Examples
///
/// ```
/// use yeti_core::{FieldSpec, Filter, Schema, sql};
///
/// let user = Schema::builder("User")
///     .field("id", FieldSpec::primary_key())
///     .field("name", FieldSpec::text())
///     .build()
///     .unwrap();
///
/// let stmt = sql::select(&user, &Filter::new().eq("name", "Ann")).unwrap();
/// assert_eq!(stmt.sql(), "SELECT id, name FROM User WHERE name=?1;");
/// assert_eq!(stmt.literal(), "SELECT id, name FROM User WHERE name='Ann';");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Value>,
    literal: String,
}

impl Statement {
    /// Statement without parameters; the SQL is its own literal rendering.
    pub fn raw(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        Self {
            literal: sql.clone(),
            sql,
            params: Vec::new(),
        }
    }

    /// SQL text with `?N` placeholders.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Values bound to the placeholders, in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// SQL text with every parameter rendered as a literal.
    pub fn literal(&self) -> &str {
        &self.literal
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

/// Conjunction of equality conditions used in `WHERE` clauses.
///
/// Conditions keep insertion order.
///
/// # Examples
///
/// ```
/// use yeti_core::{Filter, Value};
///
/// let filter = Filter::new().eq("name", "Ann").eq("age", 30);
/// assert_eq!(filter.len(), 2);
///
/// let same: Filter = [("name", Value::from("Ann")), ("age", Value::from(30))]
///     .into_iter()
///     .collect();
/// assert_eq!(filter, same);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Empty filter, matching every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `field = value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.conditions.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Filter::new(), |filter, (k, v)| filter.eq(k, v))
    }
}

/// Accumulates placeholders, bound values and their literal renderings.
#[derive(Default)]
struct Binder {
    params: Vec<Value>,
}

impl Binder {
    /// Binds `value` for `field` and returns `(placeholder, literal)`.
    fn bind(&mut self, field: &FieldSpec, value: &Value) -> (String, String) {
        self.params.push(value.clone());
        (format!("?{}", self.params.len()), field.encode(value))
    }
}

/// Renders `CREATE TABLE [IF NOT EXISTS] <name> (<defs>);`.
///
/// ```
/// use yeti_core::{FieldSpec, Schema, sql};
///
/// let user = Schema::builder("User")
///     .field("id", FieldSpec::primary_key().autoincrement())
///     .field("name", FieldSpec::text())
///     .field("age", FieldSpec::integer())
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     sql::create_table(&user, false),
///     "CREATE TABLE User (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, age INTEGER);"
/// );
/// ```
pub fn create_table(schema: &Schema, if_not_exists: bool) -> String {
    let columns = schema
        .fields()
        .iter()
        .map(FieldSpec::column_definition)
        .collect::<Vec<_>>()
        .join(", ");
    let guard = if if_not_exists { " IF NOT EXISTS" } else { "" };
    format!("CREATE TABLE{guard} {} ({columns});", schema.name())
}

/// Renders `SELECT <all fields> FROM <schema> [WHERE ...];`.
///
/// # Errors
///
/// Returns [`SchemaError::UnknownField`](crate::SchemaError::UnknownField)
/// if the filter names a field the schema does not declare.
pub fn select(schema: &Schema, filter: &Filter) -> Result<Statement> {
    let columns = schema.field_names().collect::<Vec<_>>().join(", ");
    let mut binder = Binder::default();
    let mut sql = format!("SELECT {columns} FROM {}", schema.name());
    let mut literal = sql.clone();

    if !filter.is_empty() {
        let mut bound = Vec::with_capacity(filter.len());
        let mut rendered = Vec::with_capacity(filter.len());
        for (name, value) in filter.iter() {
            let (_, spec) = schema.require_field(name)?;
            let (placeholder, lit) = binder.bind(spec, value);
            bound.push(format!("{name}={placeholder}"));
            rendered.push(format!("{name}={lit}"));
        }
        sql.push_str(&format!(" WHERE {}", bound.join(" AND ")));
        literal.push_str(&format!(" WHERE {}", rendered.join(" AND ")));
    }
    sql.push(';');
    literal.push(';');

    Ok(Statement {
        sql,
        params: binder.params,
        literal,
    })
}

/// Renders an `INSERT` of the given `(field, value)` pairs.
///
/// With no pairs the row is inserted with `DEFAULT VALUES`.
pub(crate) fn insert<'a>(
    schema: &Schema,
    values: impl IntoIterator<Item = (&'a FieldSpec, &'a Value)>,
) -> Statement {
    let mut binder = Binder::default();
    let mut names = Vec::new();
    let mut placeholders = Vec::new();
    let mut literals = Vec::new();
    for (spec, value) in values {
        let (placeholder, lit) = binder.bind(spec, value);
        names.push(spec.name());
        placeholders.push(placeholder);
        literals.push(lit);
    }

    if names.is_empty() {
        return Statement::raw(format!("INSERT INTO {} DEFAULT VALUES;", schema.name()));
    }

    let head = format!("INSERT INTO {} ({})", schema.name(), names.join(", "));
    Statement {
        sql: format!("{head} VALUES ({});", placeholders.join(", ")),
        literal: format!("{head} VALUES ({});", literals.join(", ")),
        params: binder.params,
    }
}

/// Renders an `UPDATE` of the given `(field, value)` pairs keyed by `id`.
pub(crate) fn update<'a>(
    schema: &Schema,
    values: impl IntoIterator<Item = (&'a FieldSpec, &'a Value)>,
    id: i64,
) -> Statement {
    let mut binder = Binder::default();
    let mut bound = Vec::new();
    let mut rendered = Vec::new();
    for (spec, value) in values {
        let (placeholder, lit) = binder.bind(spec, value);
        bound.push(format!("{}={placeholder}", spec.name()));
        rendered.push(format!("{}={lit}", spec.name()));
    }
    binder.params.push(Value::Integer(id));
    let key = format!("?{}", binder.params.len());

    Statement {
        sql: format!(
            "UPDATE {} SET {} WHERE {ID_FIELD}={key};",
            schema.name(),
            bound.join(", ")
        ),
        literal: format!(
            "UPDATE {} SET {} WHERE {ID_FIELD}={id};",
            schema.name(),
            rendered.join(", ")
        ),
        params: binder.params,
    }
}
