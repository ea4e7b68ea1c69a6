//! The database handle.
//!
//! [`Database`] owns the single connection to the embedded store. Writes
//! open a transaction lazily and stay pending until [`commit`](Database::commit);
//! dropping the handle closes the connection and discards anything left
//! uncommitted.
//!
//! # Example
//!
//! ```
//! use yeti_core::{FieldSpec, Registry, Schema};
//! use yeti_sqlite::Database;
//!
//! let mut registry = Registry::new();
//! registry
//!     .register(
//!         Schema::builder("User")
//!             .field("id", FieldSpec::primary_key().autoincrement())
//!             .field("name", FieldSpec::text())
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let db = Database::open_in_memory().unwrap();
//! db.initialize_schemas(&registry, true).unwrap();
//! db.initialize_schemas(&registry, true).unwrap(); // IF NOT EXISTS: no-op
//! assert!(db.has_table("User").unwrap());
//! ```

use rusqlite::{Connection, params_from_iter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use yeti_core::{Registry, Statement, Value, sql};

use crate::convert;
use crate::error::Result;

/// Name under which in-memory databases are reported.
pub const IN_MEMORY: &str = ":memory:";

/// SQLite rollback journal mode, applied when the database is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    /// Journal kept in memory (the default).
    #[default]
    Memory,
    Wal,
    Off,
}

impl JournalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

/// Result of a query: column names and rows of values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Consumes the set and returns its rows.
    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }
}

/// Handle owning the connection to one database.
pub struct Database {
    name: String,
    conn: Connection,
    journal_mode: String,
}

impl Database {
    /// Opens (creating if needed) the database file `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Sqlite`](crate::DatabaseError::Sqlite) if the
    /// file cannot be opened or the journal mode cannot be applied.
    pub fn open(name: impl Into<String>, journal_mode: JournalMode) -> Result<Self> {
        let name = name.into();
        let conn = Connection::open(&name)?;
        Self::with_connection(name, conn, journal_mode)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(IN_MEMORY.to_string(), conn, JournalMode::Memory)
    }

    fn with_connection(name: String, conn: Connection, journal_mode: JournalMode) -> Result<Self> {
        debug!(database = %name, "Connecting");
        // SQLite reports the mode actually in effect, e.g. `memory` for
        // in-memory databases whatever was requested.
        let journal_mode = conn.query_row(
            &format!("PRAGMA journal_mode = {};", journal_mode.as_str()),
            [],
            |row| row.get::<_, String>(0),
        )?;
        debug!(database = %name, journal_mode = %journal_mode, "Connected");
        Ok(Self {
            name,
            conn,
            journal_mode,
        })
    }

    /// Path the database was opened with, or `:memory:`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Journal mode reported by SQLite, lowercase.
    pub fn journal_mode(&self) -> &str {
        &self.journal_mode
    }

    /// Enables or disables foreign key enforcement.
    ///
    /// SQLite ignores the switch while writes are pending.
    pub fn set_foreign_keys(&self, enabled: bool) -> Result<()> {
        let switch = if enabled { "ON" } else { "OFF" };
        self.conn
            .execute_batch(&format!("PRAGMA foreign_keys = {switch};"))?;
        Ok(())
    }

    /// Executes one or more parameterless statements.
    pub fn execute(&self, sql: &str) -> Result<()> {
        debug!(database = %self.name, "{sql}");
        self.begin()?;
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Executes a generated statement and returns the number of rows changed.
    pub fn execute_statement(&self, statement: &Statement) -> Result<usize> {
        debug!(database = %self.name, "{statement}");
        self.begin()?;
        let params = statement.params().iter().map(convert::to_sql);
        let rows = self.conn.execute(statement.sql(), params_from_iter(params))?;
        Ok(rows)
    }

    /// Runs a query and collects every row.
    pub fn query(&self, statement: &Statement) -> Result<RowSet> {
        debug!(database = %self.name, "{statement}");
        let mut stmt = self.conn.prepare(statement.sql())?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let params = statement.params().iter().map(convert::to_sql);
        let mut rows = stmt.query(params_from_iter(params))?;
        let mut collected = Vec::new();
        while let Some(row) = rows.next()? {
            collected.push(read_row(row, columns.len())?);
        }

        Ok(RowSet {
            columns,
            rows: collected,
        })
    }

    /// Runs a query and returns only its first row, if any.
    ///
    /// Stepping stops after that row; the remaining matches are never read.
    pub fn query_first(&self, statement: &Statement) -> Result<Option<Vec<Value>>> {
        debug!(database = %self.name, "{statement}");
        let mut stmt = self.conn.prepare(statement.sql())?;
        let width = stmt.column_count();

        let params = statement.params().iter().map(convert::to_sql);
        let mut rows = stmt.query(params_from_iter(params))?;
        match rows.next()? {
            Some(row) => Ok(Some(read_row(row, width)?)),
            None => Ok(None),
        }
    }

    /// Commits pending writes. Does nothing when no write is pending.
    pub fn commit(&self) -> Result<()> {
        if !self.conn.is_autocommit() {
            debug!(database = %self.name, "Committing");
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    /// Discards pending writes. Does nothing when no write is pending.
    pub fn rollback(&self) -> Result<()> {
        if !self.conn.is_autocommit() {
            debug!(database = %self.name, "Rolling back");
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    /// Returns `true` while writes are waiting for [`commit`](Self::commit).
    pub fn has_pending_writes(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Row id of the most recent successful `INSERT`.
    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Checks whether a table named `name` exists.
    pub fn has_table(&self, name: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1")?;
        let count: i64 = stmt.query_row([name], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Creates one table per registered schema, in registration order, then
    /// commits once.
    ///
    /// With `create_if_missing` the statements use `IF NOT EXISTS`, so the
    /// call is idempotent. Without it, an existing table is an error.
    ///
    /// # Errors
    ///
    /// On failure the pending transaction is rolled back before the error is
    /// returned, so no table of this call survives. Writes pending from
    /// before the call are discarded with it.
    pub fn initialize_schemas(&self, registry: &Registry, create_if_missing: bool) -> Result<()> {
        let created = registry
            .iter()
            .try_for_each(|schema| self.execute(&sql::create_table(schema, create_if_missing)));
        if let Err(err) = created {
            warn!(database = %self.name, error = %err, "Schema initialization failed");
            self.rollback()?;
            return Err(err);
        }
        self.commit()?;
        info!(database = %self.name, tables = registry.len(), "Schemas initialized");
        Ok(())
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn begin(&self) -> Result<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }
}

fn read_row(row: &rusqlite::Row<'_>, width: usize) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(width);
    for idx in 0..width {
        values.push(convert::from_sql(row.get_ref(idx)?)?);
    }
    Ok(values)
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("journal_mode", &self.journal_mode)
            .finish_non_exhaustive()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if !self.conn.is_autocommit() {
            debug!(database = %self.name, "Discarding uncommitted writes");
        }
        debug!(database = %self.name, "Closing connection");
    }
}
