//! The mapping context.
//!
//! A [`Context`] owns the schema [`Registry`] and the active [`Database`].
//! It is created once at startup, receives every schema declaration, and is
//! passed by reference to everything that queries or saves records.
//!
//! # Example
//!
//! ```
//! use yeti_core::{FieldSpec, Filter, Schema, Value};
//! use yeti_sqlite::{Context, JournalMode};
//!
//! let mut ctx = Context::new();
//! ctx.register(
//!     Schema::builder("User")
//!         .field("id", FieldSpec::primary_key().autoincrement())
//!         .field("name", FieldSpec::text())
//!         .field("age", FieldSpec::integer()),
//! )
//! .unwrap();
//!
//! ctx.open(":memory:", JournalMode::Memory).unwrap();
//! ctx.initialize_schemas(true).unwrap();
//!
//! let users = ctx.model("User").unwrap();
//! let mut ann = users.new_record([("name", Value::from("Ann")), ("age", Value::from(30))]);
//! users.save(&mut ann).unwrap();
//!
//! let found = users.get(&Filter::new().eq("name", "Ann")).unwrap().unwrap();
//! assert_eq!(found.get("age"), Some(&Value::from(30)));
//! assert!(!found.is_new());
//! ```

use std::sync::Arc;

use tracing::info;
use yeti_core::{Record, Registry, Schema, SchemaBuilder};

use crate::config::DatabaseConfig;
use crate::database::{Database, IN_MEMORY, JournalMode};
use crate::error::{DatabaseError, Result};
use crate::model::{Model, SaveOutcome};

/// Registry of schemas plus the active database.
#[derive(Debug, Default)]
pub struct Context {
    registry: Registry,
    database: Option<Database>,
}

impl Context {
    /// Context with no schema and no database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context over an existing registry, with no database yet.
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry,
            database: None,
        }
    }

    /// Opens the database described by `config`, registers its schemas and
    /// creates their tables.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        let mut ctx = Self::new();
        ctx.open(&config.path, config.journal_mode)?;
        ctx.database()?.set_foreign_keys(config.foreign_keys)?;
        for def in &config.schemas {
            ctx.register(def.clone().into_builder())?;
        }
        ctx.initialize_schemas(config.create_if_missing)?;
        Ok(ctx)
    }

    /// Opens `name` and makes it the active database.
    ///
    /// Any previously active database is closed first. `:memory:` opens a
    /// private in-memory database.
    ///
    /// # Errors
    ///
    /// Failing to open the store is returned immediately; the context is
    /// then left without an active database.
    pub fn open(&mut self, name: &str, journal_mode: JournalMode) -> Result<&Database> {
        if let Some(previous) = self.database.take() {
            info!(from = %previous.name(), to = %name, "Switching database");
        }
        let database = if name == IN_MEMORY {
            Database::open_in_memory()?
        } else {
            Database::open(name, journal_mode)?
        };
        Ok(&*self.database.insert(database))
    }

    /// Closes the active database, if any, and returns it.
    pub fn close(&mut self) -> Option<Database> {
        self.database.take()
    }

    /// The active database.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DatabaseNotSet`] if no database was opened.
    pub fn database(&self) -> Result<&Database> {
        self.database.as_ref().ok_or(DatabaseError::DatabaseNotSet)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Builds and registers a schema, returning the shared handle to it.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Schema`] if the declaration is invalid or
    /// the name is already registered.
    pub fn register(&mut self, builder: SchemaBuilder) -> Result<Arc<Schema>> {
        let schema = self.registry.register(builder.build()?)?;
        Ok(schema)
    }

    /// Creates the tables of every registered schema on the active database.
    pub fn initialize_schemas(&self, create_if_missing: bool) -> Result<()> {
        self.database()?
            .initialize_schemas(&self.registry, create_if_missing)
    }

    /// Handle for the schema registered as `name`.
    pub fn model(&self, name: &str) -> Result<Model<'_>> {
        let schema = self.registry.require(name)?;
        Ok(Model::new(self, Arc::clone(schema)))
    }

    /// Renders and executes the save statement of `record` without
    /// committing.
    pub fn presave(&self, record: &mut Record) -> Result<SaveOutcome> {
        self.model(record.schema().name())?.presave(record)
    }

    /// Saves `record` and commits.
    pub fn save(&self, record: &mut Record) -> Result<SaveOutcome> {
        self.model(record.schema().name())?.save(record)
    }

    /// Commits pending writes on the active database.
    pub fn commit(&self) -> Result<()> {
        self.database()?.commit()
    }

    /// Resolves the foreign key `field` of `record`; see [`Model::related`].
    pub fn related(&self, record: &Record, field: &str) -> Result<Option<Record>> {
        self.model(record.schema().name())?.related(record, field)
    }
}
