//! Configuration-driven setup.
//!
//! Writes a YAML configuration declaring two schemas, opens the on-disk
//! database it describes, stores a record, and reopens the file to show the
//! data persisted.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p yeti-demos --example config_schemas
//! ```

use yeti_core::{Filter, Value};
use yeti_sqlite::{Context, DatabaseConfig};

const CONFIG: &str = r#"
journal_mode: wal
schemas:
  - name: Author
    fields:
      - { name: id, type: primary_key, autoincrement: true }
      - { name: name, type: text, nullable: false, unique: true }
  - name: Book
    fields:
      - { name: id, type: primary_key, autoincrement: true }
      - { name: title, type: text }
      - { name: rating, type: real }
      - { name: author, type: foreign_key, references: Author }
"#;

fn main() {
    // === Step 1: Write the configuration ===
    let dir = std::env::temp_dir().join("yeti_config_example");
    std::fs::create_dir_all(&dir).unwrap();
    let db_path = dir.join("library.db");
    std::fs::remove_file(&db_path).ok();

    let config_path = dir.join("database.yml");
    let config = format!("path: \"{}\"{CONFIG}", db_path.display());
    std::fs::write(&config_path, config).unwrap();

    // === Step 2: Open from configuration ===
    println!("=== Open ===");
    let config = DatabaseConfig::load(&config_path).unwrap();
    let ctx = Context::from_config(&config).unwrap();
    let db = ctx.database().unwrap();
    println!("Database: {} (journal: {})", db.name(), db.journal_mode());
    for schema in ctx.registry().iter() {
        let fields: Vec<&str> = schema.field_names().collect();
        println!("  {}: {}", schema.name(), fields.join(", "));
    }

    // === Step 3: Store ===
    println!("\n=== Store ===");
    let authors = ctx.model("Author").unwrap();
    let mut le_guin = authors.new_record([("name", "Ursula K. Le Guin")]);
    authors.save(&mut le_guin).unwrap();

    let books = ctx.model("Book").unwrap();
    let mut book = books.new_record([
        ("title", Value::from("The Dispossessed")),
        ("rating", Value::from(4.5)),
    ]);
    book.set_reference("author", &le_guin).unwrap();
    println!("{:?}", books.save(&mut book).unwrap());
    drop(ctx);

    // === Step 4: Reopen ===
    println!("\n=== Reopen ===");
    let ctx = Context::from_config(&config).unwrap();
    let books = ctx.model("Book").unwrap();
    for book in books.get_all(&Filter::new()).unwrap() {
        let author = books.related(&book, "author").unwrap();
        println!("{book}");
        println!("  by {}", author.map(|a| a.to_string()).unwrap_or_default());
    }

    // Cleanup
    std::fs::remove_dir_all(&dir).ok();
    println!("\nDone!");
}
