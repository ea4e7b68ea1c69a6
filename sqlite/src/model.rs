//! Schema-level record operations.
//!
//! A [`Model`] pairs a registered schema with the [`Context`] it was
//! obtained from and provides the typed CRUD surface: construct, `get`,
//! `get_all`, `save`, and lazy resolution of foreign keys.
//!
//! Constraint violations on save (duplicate unique values, missing
//! `NOT NULL` values) do not abort the caller: they are logged and reported
//! as [`SaveOutcome::Rejected`]. Every other storage error is returned.

use std::sync::Arc;

use tracing::{debug, error};
use yeti_core::{Filter, ID_FIELD, Record, Schema, SchemaError, Value, sql};

use crate::context::Context;
use crate::error::{DatabaseError, Result};

/// What a save did.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// A row was inserted; `id` is the record's id afterwards, if it has one.
    Inserted { id: Option<i64> },
    /// The row keyed by the record's id was updated.
    Updated { rows: usize },
    /// The store refused the write because of a constraint. The record is
    /// left unchanged.
    Rejected { reason: String },
}

impl SaveOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, SaveOutcome::Rejected { .. })
    }
}

/// Handle for one registered schema.
///
/// Obtained from [`Context::model`].
///
/// # Examples
///
/// ```
/// use yeti_core::{FieldSpec, Filter, Schema};
/// use yeti_sqlite::{Context, JournalMode, SaveOutcome};
///
/// let mut ctx = Context::new();
/// ctx.register(
///     Schema::builder("Tag")
///         .field("id", FieldSpec::primary_key())
///         .field("label", FieldSpec::text().unique()),
/// )
/// .unwrap();
/// ctx.open(":memory:", JournalMode::Memory).unwrap();
/// ctx.initialize_schemas(true).unwrap();
///
/// let tags = ctx.model("Tag").unwrap();
/// let mut rust = tags.new_record([("label", "rust")]);
/// assert_eq!(tags.save(&mut rust).unwrap(), SaveOutcome::Inserted { id: Some(1) });
///
/// // A second "rust" violates the UNIQUE constraint: reported, not raised.
/// let mut again = tags.new_record([("label", "rust")]);
/// assert!(tags.save(&mut again).unwrap().is_rejected());
/// assert!(again.is_new());
///
/// assert_eq!(tags.get_all(&Filter::new()).unwrap().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Model<'c> {
    ctx: &'c Context,
    schema: Arc<Schema>,
}

impl<'c> Model<'c> {
    pub(crate) fn new(ctx: &'c Context, schema: Arc<Schema>) -> Self {
        Self { ctx, schema }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Constructs a new record; see [`Record::new`].
    pub fn new_record<I, K, V>(&self, values: I) -> Record
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Record::new(Arc::clone(&self.schema), values)
    }

    /// Returns the first record matching `filter`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter names an undeclared field, if no
    /// database is open, or if the query fails.
    pub fn get(&self, filter: &Filter) -> Result<Option<Record>> {
        let statement = sql::select(&self.schema, filter)?;
        match self.ctx.database()?.query_first(&statement)? {
            Some(row) => Ok(Some(Record::from_storage(Arc::clone(&self.schema), row)?)),
            None => Ok(None),
        }
    }

    /// Returns every record matching `filter`, in storage order.
    pub fn get_all(&self, filter: &Filter) -> Result<Vec<Record>> {
        let statement = sql::select(&self.schema, filter)?;
        self.ctx
            .database()?
            .query(&statement)?
            .into_rows()
            .into_iter()
            .map(|row| {
                Record::from_storage(Arc::clone(&self.schema), row).map_err(DatabaseError::from)
            })
            .collect()
    }

    /// Executes the save statement of `record` without committing.
    ///
    /// A new record is inserted, then marked persisted. If the schema has a
    /// primary key and the record did not set one, it receives the id the
    /// store assigned, so the next save updates the same row.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingId`] when updating a record without id,
    /// and any store error other than a constraint violation.
    pub fn presave(&self, record: &mut Record) -> Result<SaveOutcome> {
        self.check_schema(record)?;
        let db = self.ctx.database()?;
        let statement = record.save_statement()?;

        let rows = match db.execute_statement(&statement) {
            Ok(rows) => rows,
            Err(err) if err.is_constraint_violation() => {
                error!(schema = %self.schema.name(), statement = %statement, error = %err, "Save rejected");
                return Ok(SaveOutcome::Rejected {
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        };

        if !record.is_new() {
            return Ok(SaveOutcome::Updated { rows });
        }
        if self.schema.primary_key().is_some() && record.id().is_none() {
            record.set(ID_FIELD, db.last_insert_id())?;
        }
        record.mark_persisted();
        Ok(SaveOutcome::Inserted { id: record.id() })
    }

    /// [`presave`](Self::presave) followed by a commit.
    ///
    /// The commit also runs when the write was rejected, flushing whatever
    /// else is pending.
    pub fn save(&self, record: &mut Record) -> Result<SaveOutcome> {
        let outcome = self.presave(record)?;
        self.ctx.commit()?;
        Ok(outcome)
    }

    /// Looks up the record referenced by the foreign key `field`.
    ///
    /// Runs `get(id = <stored id>)` on the referenced schema each time it is
    /// called; nothing is cached. Returns `None` when the field is unset or
    /// `NULL`, or when no row has that id.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::NotAReference`] if `field` is not a foreign key
    /// and [`SchemaError::UnknownSchema`] if the referenced schema is not
    /// registered.
    pub fn related(&self, record: &Record, field: &str) -> Result<Option<Record>> {
        self.check_schema(record)?;
        let spec = self
            .schema
            .field(field)
            .ok_or_else(|| SchemaError::UnknownField {
                schema: self.schema.name().to_string(),
                field: field.to_string(),
            })?;
        let target = spec.references().ok_or_else(|| SchemaError::NotAReference {
            schema: self.schema.name().to_string(),
            field: field.to_string(),
        })?;

        let id = match record.get(field) {
            None | Some(Value::Null) => return Ok(None),
            Some(id) => id.clone(),
        };
        debug!(schema = %self.schema.name(), field = %field, target = %target, id = %id, "Resolving reference");
        self.ctx
            .model(target)?
            .get(&Filter::new().eq(ID_FIELD, id))
    }

    fn check_schema(&self, record: &Record) -> Result<()> {
        if record.schema().name() != self.schema.name() {
            return Err(SchemaError::SchemaMismatch {
                expected: self.schema.name().to_string(),
                found: record.schema().name().to_string(),
            }
            .into());
        }
        Ok(())
    }
}
