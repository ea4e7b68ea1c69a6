//! Core types of the yeti object-relational mapping layer.
//!
//! This crate holds everything that can be done without a database
//! connection:
//!
//! - [`Value`]: a dynamically typed column value.
//! - [`FieldSpec`] / [`FieldKind`]: column descriptors with SQL literal
//!   encoding, decoding, validation and DDL rendering.
//! - [`Schema`] / [`SchemaBuilder`]: ordered, named field collections,
//!   declared once at startup and kept in a [`Registry`].
//! - [`Record`]: field values bound to a schema, with new/persisted state.
//! - [`sql`]: generation of `CREATE TABLE`, `SELECT`, `INSERT` and `UPDATE`
//!   statements, with bound parameters and a literal rendering for logs.
//!
//! Executing statements is the job of the `yeti-sqlite` crate.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use yeti_core::*;
//!
//! let mut registry = Registry::new();
//! let user = registry
//!     .register(
//!         Schema::builder("User")
//!             .field("id", FieldSpec::primary_key().autoincrement())
//!             .field("name", FieldSpec::text())
//!             .field("age", FieldSpec::integer())
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! assert_eq!(
//!     sql::create_table(&user, false),
//!     "CREATE TABLE User (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, age INTEGER);"
//! );
//!
//! let ann = Record::new(Arc::clone(&user), [("name", Value::from("Ann")), ("age", Value::from(30))]);
//! assert_eq!(
//!     ann.save_statement().unwrap().literal(),
//!     "INSERT INTO User (name, age) VALUES ('Ann', 30);"
//! );
//! ```

mod error;
mod field;
mod record;
mod schema;
pub mod sql;
mod value;

pub use error::{Result, SchemaError};
pub use field::{FieldKind, FieldSpec};
pub use record::{Record, RecordState};
pub use schema::{FieldDef, ID_FIELD, Registry, Schema, SchemaBuilder, SchemaDef};
pub use sql::{Filter, Statement};
pub use value::Value;
