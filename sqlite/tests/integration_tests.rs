//! Integration tests for the yeti-sqlite crate.

use yeti_core::{FieldSpec, Filter, Record, Schema, SchemaError, Value, sql};
use yeti_sqlite::{Context, DatabaseConfig, DatabaseError, JournalMode, SaveOutcome};

/// Registers `User{id, name, age}` and `Post{id, title, author -> User}`.
fn register_blog(ctx: &mut Context) {
    ctx.register(
        Schema::builder("User")
            .field("id", FieldSpec::primary_key().autoincrement())
            .field("name", FieldSpec::text())
            .field("age", FieldSpec::integer()),
    )
    .unwrap();
    ctx.register(
        Schema::builder("Post")
            .field("id", FieldSpec::primary_key().autoincrement())
            .field("title", FieldSpec::text().not_null())
            .field("author", FieldSpec::foreign_key("User")),
    )
    .unwrap();
}

/// Helper to set up an in-memory context with the blog tables created.
fn setup() -> Context {
    let mut ctx = Context::new();
    register_blog(&mut ctx);
    ctx.open(":memory:", JournalMode::Memory).unwrap();
    ctx.initialize_schemas(true).unwrap();
    ctx
}

fn user(ctx: &Context, name: &str, age: i64) -> Record {
    let users = ctx.model("User").unwrap();
    let mut record = users.new_record([("name", Value::from(name)), ("age", Value::from(age))]);
    assert!(matches!(
        users.save(&mut record).unwrap(),
        SaveOutcome::Inserted { id: Some(_) }
    ));
    record
}

// =============================================================================
// Statement shapes
// =============================================================================

#[test]
fn test_user_scenario_statements() {
    let ctx = setup();
    let schema = ctx.registry().get("User").unwrap();
    assert_eq!(
        sql::create_table(schema, false),
        "CREATE TABLE User (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, age INTEGER);"
    );

    let users = ctx.model("User").unwrap();
    let ann = users.new_record([("name", Value::from("Ann")), ("age", Value::from(30))]);
    assert_eq!(
        ann.save_statement().unwrap().literal(),
        "INSERT INTO User (name, age) VALUES ('Ann', 30);"
    );
}

#[test]
fn test_field_order_is_shared_by_ddl_select_and_insert() {
    let ctx = setup();
    let schema = ctx.registry().get("Post").unwrap();
    let declared: Vec<&str> = schema.field_names().collect();

    let ddl = sql::create_table(schema, true);
    let ddl_columns: Vec<&str> = ddl
        .split_once('(')
        .unwrap()
        .1
        .split(", ")
        .map(|def| def.split(' ').next().unwrap())
        .collect();
    assert_eq!(ddl_columns, declared);

    let select = sql::select(schema, &Filter::new()).unwrap();
    assert_eq!(select.sql(), format!("SELECT {} FROM Post;", declared.join(", ")));

    let full = Record::new(
        schema.clone(),
        [
            ("author", Value::from(1)),
            ("title", Value::from("t")),
            ("id", Value::from(9)),
        ],
    );
    assert_eq!(
        full.save_statement().unwrap().sql(),
        format!("INSERT INTO Post ({}) VALUES (?1, ?2, ?3);", declared.join(", "))
    );
}

// =============================================================================
// Record lifecycle
// =============================================================================

#[test]
fn test_save_then_get_round_trip() {
    let ctx = setup();
    let users = ctx.model("User").unwrap();
    let mut ann = users.new_record([("name", Value::from("O'Brien")), ("age", Value::from(30))]);
    assert!(ann.is_new());
    users.save(&mut ann).unwrap();
    assert!(!ann.is_new());

    let found = users
        .get(&Filter::new().eq("name", "O'Brien"))
        .unwrap()
        .expect("saved record should be found");
    assert!(!found.is_new());
    assert_eq!(found.get("name"), Some(&Value::from("O'Brien")));
    assert_eq!(found.get("age"), Some(&Value::from(30)));
    assert_eq!(found.id(), ann.id());
}

#[test]
fn test_second_save_updates_by_id() {
    let ctx = setup();
    let users = ctx.model("User").unwrap();
    let mut ann = users.new_record([("name", Value::from("Ann")), ("age", Value::from(30))]);

    let first = users.save(&mut ann).unwrap();
    assert_eq!(first, SaveOutcome::Inserted { id: Some(1) });
    assert_eq!(
        ann.save_statement().unwrap().literal(),
        "UPDATE User SET id=1, name='Ann', age=30 WHERE id=1;"
    );

    ann.set("age", 31).unwrap();
    assert_eq!(users.save(&mut ann).unwrap(), SaveOutcome::Updated { rows: 1 });
    assert_eq!(users.save(&mut ann).unwrap(), SaveOutcome::Updated { rows: 1 });

    let all = users.get_all(&Filter::new()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].get("age"), Some(&Value::from(31)));
}

#[test]
fn test_get_and_get_all_on_no_match() {
    let ctx = setup();
    user(&ctx, "Ann", 30);
    let users = ctx.model("User").unwrap();
    let filter = Filter::new().eq("name", "Nobody");
    assert!(users.get(&filter).unwrap().is_none());
    assert!(users.get_all(&filter).unwrap().is_empty());
}

#[test]
fn test_get_all_with_conjunction() {
    let ctx = setup();
    user(&ctx, "Ann", 30);
    user(&ctx, "Bo", 30);
    user(&ctx, "Ann", 52);

    let users = ctx.model("User").unwrap();
    let thirty = users.get_all(&Filter::new().eq("age", 30)).unwrap();
    assert_eq!(thirty.len(), 2);
    assert!(thirty.iter().all(|r| !r.is_new()));

    let ann_52 = users
        .get_all(&Filter::new().eq("name", "Ann").eq("age", 52))
        .unwrap();
    assert_eq!(ann_52.len(), 1);
    assert_eq!(ann_52[0].id(), Some(3));

    let first_ann = users.get(&Filter::new().eq("name", "Ann")).unwrap().unwrap();
    assert_eq!(first_ann.id(), Some(1));
}

#[test]
fn test_filter_on_undeclared_field_is_an_error() {
    let ctx = setup();
    let users = ctx.model("User").unwrap();
    let err = users.get(&Filter::new().eq("email", "x")).unwrap_err();
    assert!(matches!(
        err,
        DatabaseError::Schema(SchemaError::UnknownField { .. })
    ));
}

#[test]
fn test_filter_values_are_bound_not_interpolated() {
    let ctx = setup();
    user(&ctx, "Ann", 30);
    let users = ctx.model("User").unwrap();
    assert!(users
        .get_all(&Filter::new().eq("age", "30 OR 1=1"))
        .unwrap()
        .is_empty());
    assert_eq!(ctx.registry().len(), 2);
    assert!(ctx.database().unwrap().has_table("User").unwrap());
}

#[test]
fn test_construction_drops_invalid_values() {
    let ctx = setup();
    let users = ctx.model("User").unwrap();
    let mut record = users.new_record([
        ("name", Value::from(42)),
        ("age", Value::from(7)),
        ("nickname", Value::from("x")),
    ]);
    assert_eq!(record.rejected(), ["name", "nickname"]);
    users.save(&mut record).unwrap();

    let stored = users.get(&Filter::new().eq("age", 7)).unwrap().unwrap();
    assert_eq!(stored.get("name"), Some(&Value::Null));
}

#[test]
fn test_clearing_a_field_persists_null() {
    let ctx = setup();
    let mut ann = user(&ctx, "Ann", 30);
    let users = ctx.model("User").unwrap();

    ann.set("name", Value::Null).unwrap();
    assert_eq!(users.save(&mut ann).unwrap(), SaveOutcome::Updated { rows: 1 });

    let reloaded = users.get(&Filter::new().eq("id", 1)).unwrap().unwrap();
    assert_eq!(reloaded.get("name"), Some(&Value::Null));
    assert_eq!(reloaded.get("age"), Some(&Value::from(30)));
}

#[test]
fn test_presave_leaves_writes_pending() {
    let ctx = setup();
    let users = ctx.model("User").unwrap();
    let mut ann = users.new_record([("name", "Ann")]);
    ctx.presave(&mut ann).unwrap();
    assert!(ctx.database().unwrap().has_pending_writes());
    ctx.commit().unwrap();
    assert!(!ctx.database().unwrap().has_pending_writes());
}

// =============================================================================
// Integrity violations
// =============================================================================

#[test]
fn test_not_null_violation_is_reported_not_raised() {
    let ctx = setup();
    let posts = ctx.model("Post").unwrap();
    let mut untitled = posts.new_record(Vec::<(&str, Value)>::new());
    let outcome = posts.save(&mut untitled).unwrap();
    match outcome {
        SaveOutcome::Rejected { reason } => assert!(reason.contains("NOT NULL")),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(untitled.is_new());
    assert!(posts.get_all(&Filter::new()).unwrap().is_empty());

    // The context stays usable after a rejected save.
    let mut titled = posts.new_record([("title", "ok")]);
    assert!(!posts.save(&mut titled).unwrap().is_rejected());
}

#[test]
fn test_unique_violation_is_reported_not_raised() {
    let mut ctx = Context::new();
    ctx.register(
        Schema::builder("Account")
            .field("id", FieldSpec::primary_key())
            .field("email", FieldSpec::text().unique()),
    )
    .unwrap();
    ctx.open(":memory:", JournalMode::Memory).unwrap();
    ctx.initialize_schemas(true).unwrap();

    let accounts = ctx.model("Account").unwrap();
    let mut first = accounts.new_record([("email", "a@example.com")]);
    let mut dup = accounts.new_record([("email", "a@example.com")]);
    assert!(!accounts.save(&mut first).unwrap().is_rejected());
    assert!(accounts.save(&mut dup).unwrap().is_rejected());
    assert_eq!(accounts.get_all(&Filter::new()).unwrap().len(), 1);
}

#[test]
fn test_datatype_mismatch_is_reported_not_raised() {
    let ctx = setup();
    let users = ctx.model("User").unwrap();
    let mut bad_id = users.new_record([("id", "abc"), ("name", "Bo")]);
    assert!(bad_id.rejected().is_empty());

    match users.save(&mut bad_id).unwrap() {
        SaveOutcome::Rejected { reason } => assert!(reason.contains("datatype mismatch")),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(bad_id.is_new());

    // The context stays usable after the rejected save.
    let ann = user(&ctx, "Ann", 30);
    assert_eq!(ann.id(), Some(1));
    assert_eq!(users.get_all(&Filter::new()).unwrap().len(), 1);
}

#[test]
fn test_update_of_record_without_id_fails() {
    let mut ctx = Context::new();
    ctx.register(Schema::builder("Note").field("body", FieldSpec::text()))
        .unwrap();
    ctx.open(":memory:", JournalMode::Memory).unwrap();
    ctx.initialize_schemas(true).unwrap();

    let notes = ctx.model("Note").unwrap();
    let mut note = notes.new_record([("body", "hi")]);
    assert_eq!(
        notes.save(&mut note).unwrap(),
        SaveOutcome::Inserted { id: None }
    );
    assert!(matches!(
        notes.save(&mut note),
        Err(DatabaseError::Schema(SchemaError::MissingId(_)))
    ));
}

// =============================================================================
// Lazy references
// =============================================================================

#[test]
fn test_reference_resolves_on_request_without_caching() {
    let ctx = setup();
    let ann = user(&ctx, "Ann", 30);

    let posts = ctx.model("Post").unwrap();
    let mut post = posts.new_record([("title", "Hello")]);
    post.set_reference("author", &ann).unwrap();
    posts.save(&mut post).unwrap();

    // Loading the post keeps the raw id.
    let loaded = posts.get(&Filter::new().eq("title", "Hello")).unwrap().unwrap();
    assert_eq!(loaded.get("author"), Some(&Value::from(ann.id().unwrap())));

    let first = posts.related(&loaded, "author").unwrap().unwrap();
    assert_eq!(first.get("age"), Some(&Value::from(30)));

    // Each read performs a fresh lookup and sees the latest row.
    let users = ctx.model("User").unwrap();
    let mut older = first.clone();
    older.set("age", 31).unwrap();
    users.save(&mut older).unwrap();

    let second = ctx.related(&loaded, "author").unwrap().unwrap();
    assert_eq!(second.get("age"), Some(&Value::from(31)));
    assert_eq!(first.get("age"), Some(&Value::from(30)));
}

#[test]
fn test_reference_edge_cases() {
    let ctx = setup();
    let posts = ctx.model("Post").unwrap();

    let mut orphan = posts.new_record([("title", "Orphan")]);
    posts.save(&mut orphan).unwrap();
    assert!(posts.related(&orphan, "author").unwrap().is_none());

    let mut dangling = posts.new_record([("title", Value::from("Dangling")), ("author", Value::from(99))]);
    posts.save(&mut dangling).unwrap();
    assert!(posts.related(&dangling, "author").unwrap().is_none());

    assert!(matches!(
        posts.related(&orphan, "title"),
        Err(DatabaseError::Schema(SchemaError::NotAReference { .. }))
    ));

    let users = ctx.model("User").unwrap();
    assert!(matches!(
        users.related(&orphan, "author"),
        Err(DatabaseError::Schema(SchemaError::SchemaMismatch { .. }))
    ));
}

#[test]
fn test_reference_to_unregistered_schema() {
    let mut ctx = Context::new();
    ctx.register(
        Schema::builder("Comment")
            .field("id", FieldSpec::primary_key())
            .field("post", FieldSpec::foreign_key("Post")),
    )
    .unwrap();
    ctx.open(":memory:", JournalMode::Memory).unwrap();
    ctx.initialize_schemas(true).unwrap();

    let comments = ctx.model("Comment").unwrap();
    let mut comment = comments.new_record([("post", 1)]);
    comments.save(&mut comment).unwrap();
    assert!(matches!(
        comments.related(&comment, "post"),
        Err(DatabaseError::Schema(SchemaError::UnknownSchema(_)))
    ));
}

// =============================================================================
// Database lifecycle
// =============================================================================

#[test]
fn test_initialize_schemas_twice_is_idempotent() {
    let ctx = setup();
    ctx.initialize_schemas(true).unwrap();
    ctx.initialize_schemas(true).unwrap();
    let tables = ctx
        .database()
        .unwrap()
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('User', 'Post')",
            [],
            |row| row.get::<_, i64>(0),
        )
        .unwrap();
    assert_eq!(tables, 2);
}

#[test]
fn test_initialize_without_guard_propagates_failure() {
    let ctx = setup();
    assert!(matches!(
        ctx.initialize_schemas(false),
        Err(DatabaseError::Sqlite(_))
    ));
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blog.db");
    let path = path.to_string_lossy();

    let mut ctx = Context::new();
    register_blog(&mut ctx);
    ctx.open(&path, JournalMode::Delete).unwrap();
    ctx.initialize_schemas(true).unwrap();
    user(&ctx, "Ann", 30);
    drop(ctx);

    let mut ctx = Context::new();
    register_blog(&mut ctx);
    ctx.open(&path, JournalMode::Delete).unwrap();
    ctx.initialize_schemas(true).unwrap();
    let users = ctx.model("User").unwrap();
    assert_eq!(users.get_all(&Filter::new()).unwrap().len(), 1);
}

#[test]
fn test_uncommitted_writes_are_discarded_on_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pending.db");
    let path = path.to_string_lossy();

    let mut ctx = Context::new();
    register_blog(&mut ctx);
    ctx.open(&path, JournalMode::Delete).unwrap();
    ctx.initialize_schemas(true).unwrap();
    let mut ann = ctx.model("User").unwrap().new_record([("name", "Ann")]);
    ctx.presave(&mut ann).unwrap();
    drop(ctx.close());

    ctx.open(&path, JournalMode::Delete).unwrap();
    assert!(ctx.model("User").unwrap().get_all(&Filter::new()).unwrap().is_empty());
}

#[test]
fn test_context_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("configured.db");
    let yaml = format!(
        r#"
path: "{}"
journal_mode: delete
foreign_keys: true
schemas:
  - name: User
    fields:
      - {{ name: id, type: primary_key, autoincrement: true }}
      - {{ name: name, type: text, nullable: false, unique: true }}
  - name: Post
    fields:
      - {{ name: id, type: primary_key, autoincrement: true }}
      - {{ name: title, type: text }}
      - {{ name: author, type: foreign_key, references: User }}
"#,
        db_path.display()
    );
    let config_path = dir.path().join("database.yml");
    std::fs::write(&config_path, yaml).unwrap();

    let config = DatabaseConfig::load(&config_path).unwrap();
    let ctx = Context::from_config(&config).unwrap();
    let db = ctx.database().unwrap();
    assert_eq!(db.journal_mode(), "delete");
    assert!(db.has_table("User").unwrap());
    assert!(db.has_table("Post").unwrap());

    let users = ctx.model("User").unwrap();
    let mut ann = users.new_record([("name", "Ann")]);
    assert!(!users.save(&mut ann).unwrap().is_rejected());
    let mut ann_again = users.new_record([("name", "Ann")]);
    assert!(users.save(&mut ann_again).unwrap().is_rejected());
}

#[test]
fn test_records_serialize_as_maps() {
    let ctx = setup();
    let ann = user(&ctx, "Ann", 30);
    let json = serde_json::to_value(&ann).unwrap();
    assert_eq!(json, serde_json::json!({"id": 1, "name": "Ann", "age": 30}));
    assert_eq!(ann.to_string(), "User {id: 1, name: 'Ann', age: 30}");
}
