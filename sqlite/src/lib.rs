//! SQLite storage for yeti schemas.
//!
//! This crate executes what `yeti-core` generates: it opens the embedded
//! database, creates one table per registered schema, and provides typed
//! `get`, `get_all` and `save` operations over [`Record`](yeti_core::Record)s.
//!
//! # Architecture
//!
//! - **`database`**: [`Database`], the handle owning the connection
//!   (execute, query, commit, table creation)
//! - **`context`**: [`Context`], the schema registry plus the active
//!   database, passed to every operation
//! - **`model`**: [`Model`], schema-level queries, saves and lazy
//!   reference resolution
//! - **`config`**: [`DatabaseConfig`], YAML settings and declarative schemas
//! - **`convert`**: value conversion to and from SQLite
//!
//! # Quick start
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
//! ctx.register(
//!     Schema::builder("Post")
//!         .field("id", FieldSpec::primary_key().autoincrement())
//!         .field("title", FieldSpec::text())
//!         .field("author", FieldSpec::foreign_key("User")),
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
//! let posts = ctx.model("Post").unwrap();
//! let mut post = posts.new_record([("title", "Hello")]);
//! post.set_reference("author", &ann).unwrap();
//! posts.save(&mut post).unwrap();
//!
//! let author = posts.related(&post, "author").unwrap().unwrap();
//! assert_eq!(author.get("name"), Some(&Value::from("Ann")));
//! ```
//!
//! # Logging
//!
//! Every statement is logged at `debug` level through [`tracing`], rendered
//! with literal values. Rejected saves are logged at `error` level.

mod config;
mod context;
mod convert;
mod database;
mod error;
mod model;

pub use config::DatabaseConfig;
pub use context::Context;
pub use database::{Database, IN_MEMORY, JournalMode, RowSet};
pub use error::{DatabaseError, Result};
pub use model::{Model, SaveOutcome};
