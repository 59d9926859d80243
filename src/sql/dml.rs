//! DML (Data Manipulation Language) support.
//!
//! Builders for the write statements an adapter issues:
//!
//! - [`Insert`] - one row, null fields left to column defaults
//! - [`UpdateOne`] / [`DeleteOne`] - one row addressed by primary key
//! - [`UpdateAll`] / [`DeleteAll`] - every row matched by a [`Query`]
//!
//! # Examples
//!
//! ```ignore
//! use pgquery::dml::{Insert, UpdateOne, DeleteAll};
//!
//! let insert = Insert::into("users")
//!     .value("name", "Alice")
//!     .returning(["id"]);
//!
//! let update = UpdateOne::by_key("users", "id", 1).set("name", "Bob");
//!
//! let delete = DeleteAll::new(&query);
//! ```

use super::error::{CompileError, CompileResult};
use super::expr::{Expr, Scope};
use super::literal::Literal;
use super::query::{where_clause, Query, Source};
use super::token::{Token, TokenStream};
use crate::compile::Compiler;

// ============================================================================
// INSERT
// ============================================================================

/// INSERT of a single row.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Insert {
    pub table: String,
    pub fields: Vec<(String, Literal)>,
    pub returning: Vec<String>,
}

impl Insert {
    /// Create a new INSERT statement.
    pub fn into(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
            returning: Vec::new(),
        }
    }

    /// Add a field value.
    pub fn value(mut self, column: impl Into<String>, value: impl Into<Literal>) -> Self {
        self.fields.push((column.into(), value.into()));
        self
    }

    /// Add several field values.
    pub fn values<C, V>(mut self, fields: impl IntoIterator<Item = (C, V)>) -> Self
    where
        C: Into<String>,
        V: Into<Literal>,
    {
        self.fields
            .extend(fields.into_iter().map(|(c, v)| (c.into(), v.into())));
        self
    }

    /// Set the RETURNING columns.
    pub fn returning(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.returning = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Generate SQL with the default compiler.
    pub fn to_sql(&self) -> CompileResult<String> {
        self.to_sql_with(&Compiler::default())
    }

    pub fn to_sql_with(&self, compiler: &Compiler) -> CompileResult<String> {
        compiler.insert(self)
    }

    /// Convert to token stream. Null-valued fields are left out.
    pub fn to_tokens(&self, max_depth: usize) -> CompileResult<TokenStream> {
        let mut ts = TokenStream::new();
        ts.push(Token::Insert)
            .space()
            .push(Token::Into)
            .space()
            .push(Token::Ident(self.table.clone()))
            .space();

        let present: Vec<&(String, Literal)> =
            self.fields.iter().filter(|(_, v)| !v.is_null()).collect();

        if present.is_empty() {
            ts.push(Token::Default).space().push(Token::Values);
        } else {
            let columns = present
                .iter()
                .map(|(column, _)| ident(column))
                .collect::<Vec<_>>();
            let values = present
                .iter()
                .map(|(_, value)| value.to_tokens(max_depth))
                .collect::<CompileResult<Vec<_>>>()?;

            ts.lparen().comma_separated(&columns).rparen().space();
            ts.push(Token::Values)
                .space()
                .lparen()
                .comma_separated(&values)
                .rparen();
        }

        if !self.returning.is_empty() {
            let columns = self.returning.iter().map(|c| ident(c)).collect::<Vec<_>>();
            ts.space()
                .push(Token::Returning)
                .space()
                .comma_separated(&columns);
        }

        Ok(ts)
    }
}

// ============================================================================
// UPDATE (single row)
// ============================================================================

/// UPDATE of the row with a given primary key.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct UpdateOne {
    pub table: String,
    pub key_column: String,
    pub key_value: Literal,
    pub fields: Vec<(String, Literal)>,
}

impl UpdateOne {
    /// Create an UPDATE of the row where `key_column = key_value`.
    pub fn by_key(
        table: impl Into<String>,
        key_column: impl Into<String>,
        key_value: impl Into<Literal>,
    ) -> Self {
        Self {
            table: table.into(),
            key_column: key_column.into(),
            key_value: key_value.into(),
            fields: Vec::new(),
        }
    }

    /// Add a SET clause.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Literal>) -> Self {
        self.fields.push((column.into(), value.into()));
        self
    }

    /// Add multiple SET clauses.
    pub fn set_many<C, V>(mut self, fields: impl IntoIterator<Item = (C, V)>) -> Self
    where
        C: Into<String>,
        V: Into<Literal>,
    {
        self.fields
            .extend(fields.into_iter().map(|(c, v)| (c.into(), v.into())));
        self
    }

    /// Generate SQL with the default compiler.
    pub fn to_sql(&self) -> CompileResult<String> {
        self.to_sql_with(&Compiler::default())
    }

    pub fn to_sql_with(&self, compiler: &Compiler) -> CompileResult<String> {
        compiler.update_one(self)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, max_depth: usize) -> CompileResult<TokenStream> {
        if self.fields.is_empty() {
            return Err(CompileError::EmptyAssignments {
                table: self.table.clone(),
            });
        }

        let assignments = self
            .fields
            .iter()
            .map(|(column, value)| Ok(assignment(column, value.to_tokens(max_depth)?)))
            .collect::<CompileResult<Vec<_>>>()?;

        let mut ts = TokenStream::new();
        ts.push(Token::Update)
            .space()
            .push(Token::Ident(self.table.clone()))
            .space()
            .push(Token::Set)
            .space()
            .comma_separated(&assignments)
            .space();
        ts.append(&key_filter(&self.key_column, &self.key_value, max_depth)?);
        Ok(ts)
    }
}

// ============================================================================
// UPDATE (bulk)
// ============================================================================

/// UPDATE of every row matched by a query.
#[derive(Debug, Clone)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct UpdateAll<'q> {
    pub query: &'q Query,
    pub values: Vec<(String, Expr)>,
}

impl<'q> UpdateAll<'q> {
    pub fn new(query: &'q Query) -> Self {
        Self {
            query,
            values: Vec::new(),
        }
    }

    /// Add a SET clause.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.values.push((column.into(), value.into()));
        self
    }

    /// Add multiple SET clauses.
    pub fn set_many<C, V>(mut self, values: impl IntoIterator<Item = (C, V)>) -> Self
    where
        C: Into<String>,
        V: Into<Expr>,
    {
        self.values
            .extend(values.into_iter().map(|(c, v)| (c.into(), v.into())));
        self
    }

    /// Generate SQL with the default compiler.
    pub fn to_sql(&self) -> CompileResult<String> {
        self.to_sql_with(&Compiler::default())
    }

    pub fn to_sql_with(&self, compiler: &Compiler) -> CompileResult<String> {
        compiler.update_all(self)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, max_depth: usize) -> CompileResult<TokenStream> {
        let aliases = self.query.bind_aliases();
        let scope = Scope::new(&self.query.sources, &aliases, max_depth);
        let (alias, source) = bulk_target(self.query, &scope)?;

        if self.values.is_empty() {
            return Err(CompileError::EmptyAssignments {
                table: source.table.clone(),
            });
        }

        let assignments = self
            .values
            .iter()
            .map(|(column, value)| Ok(assignment(column, value.to_tokens(&scope)?)))
            .collect::<CompileResult<Vec<_>>>()?;

        let mut ts = TokenStream::new();
        ts.push(Token::Update)
            .space()
            .push(Token::Ident(source.table.clone()))
            .space()
            .push(Token::As)
            .space()
            .push(Token::Ident(alias.to_string()))
            .space()
            .push(Token::Set)
            .space()
            .comma_separated(&assignments);

        if let Some(filter) = where_clause(&self.query.wheres, &scope)? {
            ts.space().append(&filter);
        }
        Ok(ts)
    }
}

// ============================================================================
// DELETE (single row)
// ============================================================================

/// DELETE of the row with a given primary key.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct DeleteOne {
    pub table: String,
    pub key_column: String,
    pub key_value: Literal,
}

impl DeleteOne {
    /// Create a DELETE of the row where `key_column = key_value`.
    pub fn by_key(
        table: impl Into<String>,
        key_column: impl Into<String>,
        key_value: impl Into<Literal>,
    ) -> Self {
        Self {
            table: table.into(),
            key_column: key_column.into(),
            key_value: key_value.into(),
        }
    }

    /// Generate SQL with the default compiler.
    pub fn to_sql(&self) -> CompileResult<String> {
        self.to_sql_with(&Compiler::default())
    }

    pub fn to_sql_with(&self, compiler: &Compiler) -> CompileResult<String> {
        compiler.delete_one(self)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, max_depth: usize) -> CompileResult<TokenStream> {
        let mut ts = TokenStream::new();
        ts.push(Token::Delete)
            .space()
            .push(Token::From)
            .space()
            .push(Token::Ident(self.table.clone()))
            .space();
        ts.append(&key_filter(&self.key_column, &self.key_value, max_depth)?);
        Ok(ts)
    }
}

// ============================================================================
// DELETE (bulk)
// ============================================================================

/// DELETE of every row matched by a query.
#[derive(Debug, Clone)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct DeleteAll<'q> {
    pub query: &'q Query,
}

impl<'q> DeleteAll<'q> {
    pub fn new(query: &'q Query) -> Self {
        Self { query }
    }

    /// Generate SQL with the default compiler.
    pub fn to_sql(&self) -> CompileResult<String> {
        self.to_sql_with(&Compiler::default())
    }

    pub fn to_sql_with(&self, compiler: &Compiler) -> CompileResult<String> {
        compiler.delete_all(self)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, max_depth: usize) -> CompileResult<TokenStream> {
        let aliases = self.query.bind_aliases();
        let scope = Scope::new(&self.query.sources, &aliases, max_depth);
        let (alias, source) = bulk_target(self.query, &scope)?;

        let mut ts = TokenStream::new();
        ts.push(Token::Delete)
            .space()
            .push(Token::From)
            .space()
            .push(Token::Ident(source.table.clone()))
            .space()
            .push(Token::As)
            .space()
            .push(Token::Ident(alias.to_string()));

        if let Some(filter) = where_clause(&self.query.wheres, &scope)? {
            ts.space().append(&filter);
        }
        Ok(ts)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn ident(name: &str) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Ident(name.to_string()));
    ts
}

/// `"column" = <value>`
fn assignment(column: &str, value: TokenStream) -> TokenStream {
    let mut ts = ident(column);
    ts.space().push(Token::Eq).space().append(&value);
    ts
}

/// `WHERE "key" = <value>`
fn key_filter(column: &str, value: &Literal, max_depth: usize) -> CompileResult<TokenStream> {
    let mut ts = TokenStream::new();
    ts.push(Token::Where).space();
    ts.append(&assignment(column, value.to_tokens(max_depth)?));
    Ok(ts)
}

/// Target table of a bulk statement: source 0. Joined sources have no
/// place in the statement, so queries with joins are rejected.
fn bulk_target<'a>(
    query: &Query,
    scope: &Scope<'a>,
) -> CompileResult<(&'a str, &'a Source)> {
    if !query.joins.is_empty() {
        return Err(CompileError::UnsupportedExpression(
            "joins are not supported in bulk update or delete".into(),
        ));
    }
    scope.source(0)
}
