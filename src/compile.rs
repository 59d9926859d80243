//! Statement compilation entry points.
//!
//! Every statement goes through a [`Compiler`], which carries the options
//! and the target dialect. The free functions compile with the default
//! compiler:
//!
//! ```text
//! Query / descriptor → bind aliases → clause renderers → tokens → SQL
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pgquery::compile::compile_select;
//! use pgquery::sql::{field, ExprExt, OrderByExpr, Query, Schema, Source};
//!
//! let users = Source::new(Arc::new(Schema::new("users")));
//! let query = Query::new()
//!     .from(users)
//!     .filter(field(0, "id").eq(5))
//!     .order_by(vec![OrderByExpr::asc(field(0, "name"))])
//!     .limit(10);
//!
//! let sql = compile_select(&query)?;
//! // SELECT "u0".*
//! // FROM "users" AS "u0"
//! // WHERE ("u0"."id" = 5)
//! // ORDER BY "u0"."name"
//! // LIMIT 10
//! ```
//!
//! Compilation is pure: a compiler holds no per-call state and can be
//! shared freely between threads.

use tracing::{debug, trace};

use crate::config::Settings;
use crate::sql::dialect::{Postgres, SqlDialect};
use crate::sql::dml::{DeleteAll, DeleteOne, Insert, UpdateAll, UpdateOne};
use crate::sql::error::{CompileError, CompileResult};
use crate::sql::expr::Expr;
use crate::sql::literal::Literal;
use crate::sql::query::Query;
use crate::sql::schema::EntityInstance;
use crate::sql::token::TokenStream;

// ============================================================================
// Options
// ============================================================================

/// Options for compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Deepest expression nesting accepted before failing with
    /// [`CompileError::DepthExceeded`].
    pub max_expression_depth: usize,

    /// Emit each generated statement as a `trace` event.
    pub log_statements: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_expression_depth: 512,
            log_statements: false,
        }
    }
}

impl CompileOptions {
    /// Set the expression depth limit.
    pub fn with_max_expression_depth(mut self, depth: usize) -> Self {
        self.max_expression_depth = depth;
        self
    }

    /// Enable or disable statement logging.
    pub fn with_log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }
}

impl From<&Settings> for CompileOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            max_expression_depth: settings.compiler.max_expression_depth,
            log_statements: settings.compiler.log_statements,
        }
    }
}

// ============================================================================
// Compiler
// ============================================================================

/// Compiles queries and row descriptors to SQL text.
#[derive(Debug, Clone)]
pub struct Compiler {
    options: CompileOptions,
    dialect: &'static dyn SqlDialect,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            dialect: &Postgres,
        }
    }

    /// Build a compiler from loaded settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(CompileOptions::from(settings))
    }

    /// Set the SQL dialect.
    pub fn with_dialect(mut self, dialect: &'static dyn SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn dialect(&self) -> &'static dyn SqlDialect {
        self.dialect
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Compile a SELECT.
    pub fn select(&self, query: &Query) -> CompileResult<String> {
        self.run("select", query.sources.len(), || {
            query.to_tokens(self.options.max_expression_depth)
        })
    }

    /// Compile a single-row INSERT.
    pub fn insert(&self, insert: &Insert) -> CompileResult<String> {
        self.run("insert", 1, || {
            insert.to_tokens(self.options.max_expression_depth)
        })
    }

    /// Compile a single-row UPDATE.
    pub fn update_one(&self, update: &UpdateOne) -> CompileResult<String> {
        self.run("update_one", 1, || {
            update.to_tokens(self.options.max_expression_depth)
        })
    }

    /// Compile a bulk UPDATE.
    pub fn update_all(&self, update: &UpdateAll<'_>) -> CompileResult<String> {
        self.run("update_all", update.query.sources.len(), || {
            update.to_tokens(self.options.max_expression_depth)
        })
    }

    /// Compile a single-row DELETE.
    pub fn delete_one(&self, delete: &DeleteOne) -> CompileResult<String> {
        self.run("delete_one", 1, || {
            delete.to_tokens(self.options.max_expression_depth)
        })
    }

    /// Compile a bulk DELETE.
    pub fn delete_all(&self, delete: &DeleteAll<'_>) -> CompileResult<String> {
        self.run("delete_all", delete.query.sources.len(), || {
            delete.to_tokens(self.options.max_expression_depth)
        })
    }

    // ========================================================================
    // Records
    // ========================================================================

    /// INSERT every field of `record`.
    pub fn insert_record(
        &self,
        record: &dyn EntityInstance,
        returning: impl IntoIterator<Item = impl Into<String>>,
    ) -> CompileResult<String> {
        let insert = Insert::into(record.entity().source())
            .values(record.field_values(true))
            .returning(returning);
        self.insert(&insert)
    }

    /// UPDATE every non-key field of `record`, keyed by its primary key.
    pub fn update_record(&self, record: &dyn EntityInstance) -> CompileResult<String> {
        let (column, value) = primary_key(record)?;
        let update = UpdateOne::by_key(record.entity().source(), column, value)
            .set_many(record.field_values(false));
        self.update_one(&update)
    }

    /// DELETE `record` by its primary key.
    pub fn delete_record(&self, record: &dyn EntityInstance) -> CompileResult<String> {
        let (column, value) = primary_key(record)?;
        let delete = DeleteOne::by_key(record.entity().source(), column, value);
        self.delete_one(&delete)
    }

    fn run(
        &self,
        statement: &'static str,
        sources: usize,
        build: impl FnOnce() -> CompileResult<TokenStream>,
    ) -> CompileResult<String> {
        debug!(statement, sources, dialect = self.dialect.name(), "compiling statement");

        match build() {
            Ok(tokens) => {
                let sql = tokens.serialize(self.dialect);
                if self.options.log_statements {
                    trace!(statement, sql = %sql, "generated SQL");
                }
                Ok(sql)
            }
            Err(err) => {
                debug!(statement, error = %err, "compilation failed");
                Err(err)
            }
        }
    }
}

fn primary_key(record: &dyn EntityInstance) -> CompileResult<(String, Literal)> {
    let entity = record.entity();
    let missing = || CompileError::MissingPrimaryKey {
        table: entity.source().to_string(),
    };
    let column = entity.primary_key().ok_or_else(missing)?;
    let value = record.primary_key_value().ok_or_else(missing)?;
    Ok((column.to_string(), value))
}

// ============================================================================
// Compilation Functions
// ============================================================================

/// Compile a SELECT with the default compiler.
pub fn compile_select(query: &Query) -> CompileResult<String> {
    Compiler::default().select(query)
}

/// Compile `INSERT INTO <table>`; null-valued fields are left out.
pub fn compile_insert<C, V>(
    table: &str,
    fields: impl IntoIterator<Item = (C, V)>,
    returning: impl IntoIterator<Item = impl Into<String>>,
) -> CompileResult<String>
where
    C: Into<String>,
    V: Into<Literal>,
{
    Insert::into(table)
        .values(fields)
        .returning(returning)
        .to_sql()
}

/// Compile an UPDATE of the row where `pk_column = pk_value`.
pub fn compile_update_one<C, V>(
    table: &str,
    pk_column: &str,
    pk_value: impl Into<Literal>,
    fields: impl IntoIterator<Item = (C, V)>,
) -> CompileResult<String>
where
    C: Into<String>,
    V: Into<Literal>,
{
    UpdateOne::by_key(table, pk_column, pk_value)
        .set_many(fields)
        .to_sql()
}

/// Compile an UPDATE of every row matched by `query`.
pub fn compile_update_all<C, V>(
    query: &Query,
    values: impl IntoIterator<Item = (C, V)>,
) -> CompileResult<String>
where
    C: Into<String>,
    V: Into<Expr>,
{
    UpdateAll::new(query).set_many(values).to_sql()
}

/// Compile a DELETE of the row where `pk_column = pk_value`.
pub fn compile_delete_one(
    table: &str,
    pk_column: &str,
    pk_value: impl Into<Literal>,
) -> CompileResult<String> {
    DeleteOne::by_key(table, pk_column, pk_value).to_sql()
}

/// Compile a DELETE of every row matched by `query`.
pub fn compile_delete_all(query: &Query) -> CompileResult<String> {
    DeleteAll::new(query).to_sql()
}

// ============================================================================
// Tests
// ============================================================================
