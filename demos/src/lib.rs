//! Schema declarations shared by the demos.

use yeti_core::{FieldSpec, Schema, SchemaBuilder};
use yeti_sqlite::{Context, Result};

/// `User{id, name, age}` with an auto-incrementing id and a unique name.
pub fn user_schema() -> SchemaBuilder {
    Schema::builder("User")
        .field("id", FieldSpec::primary_key().autoincrement())
        .field("name", FieldSpec::text().not_null().unique())
        .field("age", FieldSpec::integer())
}

/// `Post{id, title, author -> User}`.
pub fn post_schema() -> SchemaBuilder {
    Schema::builder("Post")
        .field("id", FieldSpec::primary_key().autoincrement())
        .field("title", FieldSpec::text().not_null())
        .field("author", FieldSpec::foreign_key("User"))
}

/// Registers both blog schemas on `ctx`.
pub fn register_blog(ctx: &mut Context) -> Result<()> {
    ctx.register(user_schema())?;
    ctx.register(post_schema())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_blog() {
        let mut ctx = Context::new();
        register_blog(&mut ctx).unwrap();
        assert_eq!(ctx.registry().len(), 2);
        assert!(ctx.registry().get("Post").unwrap().has_field("author"));
    }
}
