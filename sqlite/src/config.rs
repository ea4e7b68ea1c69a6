//! Database configuration.
//!
//! Defines the YAML-serializable settings used to open a database and
//! declare its schemas.
//!
//! # Example YAML
//!
//! ```yaml
//! path: blog.db
//! journal_mode: wal
//! create_if_missing: true
//! foreign_keys: true
//! schemas:
//!   - name: User
//!     fields:
//!       - { name: id, type: primary_key, autoincrement: true }
//!       - { name: name, type: text, nullable: false, unique: true }
//!       - { name: age, type: integer }
//!   - name: Post
//!     fields:
//!       - { name: id, type: primary_key, autoincrement: true }
//!       - { name: title, type: text }
//!       - { name: author, type: foreign_key, references: User }
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use yeti_core::SchemaDef;

use crate::database::JournalMode;
use crate::error::Result;

/// Settings for opening a database through [`Context::from_config`](crate::Context::from_config).
///
/// # Examples
///
/// ```
/// use yeti_sqlite::{DatabaseConfig, JournalMode};
///
/// let config = DatabaseConfig::from_yaml("path: app.db").unwrap();
/// assert_eq!(config.path, "app.db");
/// assert_eq!(config.journal_mode, JournalMode::Memory);
/// assert!(config.create_if_missing);
/// assert!(!config.foreign_keys);
/// assert!(config.schemas.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file, or `:memory:`.
    pub path: String,
    /// Journal mode applied on open.
    #[serde(default)]
    pub journal_mode: JournalMode,
    /// Create tables with `IF NOT EXISTS`.
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,
    /// Enforce foreign key constraints.
    #[serde(default)]
    pub foreign_keys: bool,
    /// Schemas registered and created on open, in order.
    #[serde(default)]
    pub schemas: Vec<SchemaDef>,
}

fn default_create_if_missing() -> bool {
    true
}

impl DatabaseConfig {
    /// Configuration for `path` with every other setting at its default.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            journal_mode: JournalMode::default(),
            create_if_missing: default_create_if_missing(),
            foreign_keys: false,
            schemas: Vec::new(),
        }
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::DatabaseError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
