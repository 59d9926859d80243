//! Integration tests for INSERT, UPDATE and DELETE compilation.

use std::sync::Arc;

use chrono::NaiveDate;
use pgquery::prelude::*;
use rust_decimal::Decimal;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

fn validate(sql: &str) {
    if let Err(e) = Parser::parse_sql(&PostgreSqlDialect {}, sql) {
        panic!("Invalid SQL: {}\nSQL: {}", e, sql);
    }
}

fn accounts() -> Arc<Schema> {
    Arc::new(
        Schema::new("accounts")
            .with_fields(["owner", "balance", "opened_on", "tags"])
            .with_primary_key("id"),
    )
}

// ============================================================================
// INSERT
// ============================================================================

#[test]
fn test_insert_encodes_each_literal_kind() {
    let sql = compile_insert(
        "accounts",
        [
            ("owner", Literal::from("O'Brien")),
            ("balance", Literal::from(Decimal::new(1050, 2))),
            (
                "opened_on",
                Literal::from(NaiveDate::from_ymd_opt(2023, 7, 4).unwrap()),
            ),
            (
                "tags",
                Literal::array(ValueType::String, [Literal::from("a"), Literal::from("b")]),
            ),
            ("avatar", Literal::binary(vec![0xde, 0xad])),
            ("active", Literal::Bool(true)),
            ("ratio", Literal::Float(0.5)),
            ("note", Literal::Null),
        ],
        ["id"],
    )
    .unwrap();

    assert_eq!(
        sql,
        "INSERT INTO \"accounts\" (\"owner\", \"balance\", \"opened_on\", \"tags\", \"avatar\", \"active\", \"ratio\") \
         VALUES ('O''Brien', 10.50, date '2023-07-04', ARRAY['a', 'b'], '\\xdead'::bytea, TRUE, 0.5::float) \
         RETURNING \"id\""
    );
}

#[test]
fn test_insert_without_values() {
    let sql = compile_insert("accounts", Vec::<(String, Literal)>::new(), ["id"]).unwrap();
    assert_eq!(sql, "INSERT INTO \"accounts\" DEFAULT VALUES RETURNING \"id\"");
    validate(&sql);
}

#[test]
fn test_empty_array_is_typed() {
    let sql = Insert::into("accounts")
        .value("tags", Literal::array(ValueType::String, []))
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO \"accounts\" (\"tags\") VALUES (ARRAY[]::text[])"
    );
    validate(&sql);
}

// ============================================================================
// Single-row UPDATE / DELETE
// ============================================================================

#[test]
fn test_update_one_by_key() {
    let sql = compile_update_one(
        "accounts",
        "id",
        42,
        [("owner", Literal::from("Ann")), ("balance", Literal::Null)],
    )
    .unwrap();
    assert_eq!(
        sql,
        "UPDATE \"accounts\" SET \"owner\" = 'Ann', \"balance\" = NULL WHERE \"id\" = 42"
    );
    validate(&sql);
}

#[test]
fn test_update_one_without_fields() {
    let result = compile_update_one("accounts", "id", 42, Vec::<(String, Literal)>::new());
    assert_eq!(
        result.unwrap_err(),
        CompileError::EmptyAssignments {
            table: "accounts".into()
        }
    );
}

#[test]
fn test_delete_one_with_string_key() {
    let sql = compile_delete_one("sessions", "token", "abc").unwrap();
    assert_eq!(sql, "DELETE FROM \"sessions\" WHERE \"token\" = 'abc'");
    validate(&sql);
}

// ============================================================================
// Bulk UPDATE / DELETE
// ============================================================================

#[test]
fn test_update_all_with_expressions() {
    let query = Query::new()
        .from(Source::new(accounts()))
        .filter(field(0, "owner").is_in(range("a", "m")));

    let sql = compile_update_all(
        &query,
        [
            ("balance", field(0, "balance").mul(2)),
            ("owner", call("upcase", vec![field(0, "owner")])),
        ],
    )
    .unwrap();
    assert_eq!(
        sql,
        "UPDATE \"accounts\" AS \"a0\" SET \"balance\" = \"a0\".\"balance\" * 2, \
         \"owner\" = upper(\"a0\".\"owner\") WHERE (\"a0\".\"owner\" BETWEEN 'a' AND 'm')"
    );
    validate(&sql);
}

#[test]
fn test_delete_all_without_filter() {
    let query = Query::new().from(Source::new(accounts()));
    assert_eq!(
        compile_delete_all(&query).unwrap(),
        "DELETE FROM \"accounts\" AS \"a0\""
    );
}

#[test]
fn test_bulk_statement_rejects_joins() {
    let query = Query::new().from(Source::new(accounts())).inner_join(
        Source::new(accounts()),
        field(1, "id").eq(field(0, "id")),
    );
    assert!(matches!(
        compile_update_all(&query, [("owner", lit("x"))]),
        Err(CompileError::UnsupportedExpression(_))
    ));
}

// ============================================================================
// Records
// ============================================================================

#[test]
fn test_record_lifecycle() {
    let compiler = Compiler::default();
    let record = Record::new(accounts())
        .set("owner", "Ann")
        .set("balance", Decimal::new(5, 0));

    let insert = compiler.insert_record(&record, ["id"]).unwrap();
    assert_eq!(
        insert,
        "INSERT INTO \"accounts\" (\"owner\", \"balance\") VALUES ('Ann', 5.0) RETURNING \"id\""
    );
    validate(&insert);

    assert!(matches!(
        compiler.update_record(&record),
        Err(CompileError::MissingPrimaryKey { .. })
    ));

    let saved = record.set("id", 7);
    let update = compiler.update_record(&saved).unwrap();
    assert_eq!(
        update,
        "UPDATE \"accounts\" SET \"owner\" = 'Ann', \"balance\" = 5.0, \"opened_on\" = NULL, \"tags\" = NULL \
         WHERE \"id\" = 7"
    );
    validate(&update);

    assert_eq!(
        compiler.delete_record(&saved).unwrap(),
        "DELETE FROM \"accounts\" WHERE \"id\" = 7"
    );
}
