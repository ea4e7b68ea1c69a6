//! Blog walkthrough.
//!
//! Declares `User` and `Post`, creates their tables in memory, saves and
//! updates records, resolves a post's author, and shows a rejected save.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p yeti-demos --example blog
//! ```

use yeti_core::{Filter, Value, sql};
use yeti_demos::register_blog;
use yeti_sqlite::{Context, JournalMode};

fn main() {
    // === Step 1: Declare schemas and open the database ===
    let mut ctx = Context::new();
    register_blog(&mut ctx).unwrap();
    ctx.open(":memory:", JournalMode::Memory).unwrap();

    println!("=== Tables ===");
    for schema in ctx.registry().iter() {
        println!("{}", sql::create_table(schema, true));
    }
    ctx.initialize_schemas(true).unwrap();

    // === Step 2: Insert ===
    println!("\n=== Insert ===");
    let users = ctx.model("User").unwrap();
    let mut ann = users.new_record([("name", Value::from("Ann")), ("age", Value::from(30))]);
    let mut bo = users.new_record([("name", Value::from("Bo")), ("age", Value::from(30))]);
    println!("{}", ann.save_statement().unwrap());
    println!("  -> {:?}", users.save(&mut ann).unwrap());
    println!("  -> {:?}", users.save(&mut bo).unwrap());

    // === Step 3: Update ===
    println!("\n=== Update ===");
    ann.set("age", 31).unwrap();
    println!("{}", ann.save_statement().unwrap());
    println!("  -> {:?}", users.save(&mut ann).unwrap());

    // === Step 4: Query ===
    println!("\n=== Query ===");
    let filter = Filter::new().eq("age", 30);
    println!("{}", sql::select(users.schema(), &filter).unwrap());
    for user in users.get_all(&filter).unwrap() {
        println!("  {user}");
    }
    let missing = users.get(&Filter::new().eq("name", "Nobody")).unwrap();
    println!("Nobody: {missing:?}");

    // === Step 5: References ===
    println!("\n=== References ===");
    let posts = ctx.model("Post").unwrap();
    let mut post = posts.new_record([("title", "Hello, yeti")]);
    post.set_reference("author", &ann).unwrap();
    posts.save(&mut post).unwrap();
    println!("Stored: {post}");
    if let Some(author) = posts.related(&post, "author").unwrap() {
        println!("Author: {author}");
        println!("As JSON: {}", serde_json::to_string(&author).unwrap());
    }

    // === Step 6: Constraint violations ===
    println!("\n=== Rejected save ===");
    let mut twin = users.new_record([("name", "Ann")]);
    let outcome = users.save(&mut twin).unwrap();
    println!("Second 'Ann': {outcome:?}");
    println!("Users stored: {}", users.get_all(&Filter::new()).unwrap().len());

    println!("\nDone!");
}
