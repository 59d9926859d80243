//! Behavioral properties that hold for every compiled statement.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use pgquery::prelude::*;
use pgquery::sql::AliasBindings;

fn sample_query() -> Query {
    let users = Arc::new(Schema::new("users").with_fields(["id", "name"]));
    let posts = Arc::new(Schema::new("posts").with_fields(["id", "user_id"]));
    Query::new()
        .from(Source::new(users.clone()))
        .left_join(Source::new(posts), field(1, "user_id").eq(field(0, "id")))
        .left_join(Source::new(users), field(2, "id").eq(field(1, "user_id")))
        .filter(field(0, "name").ilike("a%"))
        .order_by(vec![OrderByExpr::desc(field(2, "name"))])
        .limit(3)
}

#[test]
fn test_compilation_is_deterministic() {
    let query = sample_query();
    let first = compile_select(&query).unwrap();
    for _ in 0..10 {
        assert_eq!(compile_select(&query).unwrap(), first);
    }
}

#[test]
fn test_compiler_is_shareable_across_threads() {
    let query = sample_query();
    let compiler = Compiler::default();
    let expected = compiler.select(&query).unwrap();

    let results: Vec<String> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| compiler.select(&query).unwrap()))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("compile thread panicked"))
            .collect()
    });

    assert!(results.iter().all(|sql| *sql == expected));
}

#[test]
fn test_compilation_does_not_mutate_input() {
    let query = sample_query();
    let before = format!("{:?}", query.wheres);
    let _ = compile_select(&query).unwrap();
    let _ = compile_delete_all(&Query::new().from(query.sources[0].clone()));
    assert_eq!(format!("{:?}", query.wheres), before);
    assert_eq!(query.limit, Some(3));
}

#[test]
fn test_aliases_are_unique_within_a_statement() {
    let tables = ["users", "uploads", "users", "posts", "", "pages", "", "u0"];
    let bindings = AliasBindings::allocate(tables);

    assert_eq!(bindings.iter().count(), tables.len());
    let unique: HashSet<&str> = bindings.iter().collect();
    assert_eq!(unique.len(), tables.len());

    for (alias, table) in bindings.iter().zip(tables) {
        if let Some(first) = table.chars().next() {
            assert!(alias.starts_with(first));
        }
    }
}

#[test]
fn test_aliases_are_fresh_per_statement() {
    let query = sample_query();
    let sql = compile_select(&query).unwrap();
    assert!(sql.contains("FROM \"users\" AS \"u0\""));
    assert!(sql.contains("LEFT OUTER JOIN \"posts\" AS \"p0\""));
    assert!(sql.contains("LEFT OUTER JOIN \"users\" AS \"u1\""));

    // A second compilation starts again from u0.
    let delete = compile_delete_all(&Query::new().from(query.sources[2].clone())).unwrap();
    assert_eq!(delete, "DELETE FROM \"users\" AS \"u0\"");
}

#[test]
fn test_identifiers_are_always_quoted() {
    let entity = Arc::new(Schema::new("select").with_field("we\"ird"));
    let sql = compile_select(&Query::new().from(Source::new(entity))).unwrap();
    assert_eq!(sql, "SELECT \"s0\".\"we\"\"ird\"\nFROM \"select\" AS \"s0\"");
}

#[test]
fn test_string_literals_are_escaped() {
    let sql = compile_delete_one("notes", "body", "it's; DROP TABLE notes; --").unwrap();
    assert_eq!(
        sql,
        "DELETE FROM \"notes\" WHERE \"body\" = 'it''s; DROP TABLE notes; --'"
    );
}
