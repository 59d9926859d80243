//! SQL generation module.
//!
//! Type-safe builders that render PostgreSQL statements:
//!
//! - [`query`] - SELECT builder and query sources
//! - [`expr`] - Expression AST and builder DSL
//! - [`dml`] - INSERT, UPDATE and DELETE builders
//! - [`literal`] - Literal values and their encoding
//! - [`catalog`] - Operator and function rendering table
//! - [`alias`] - Table alias allocation
//! - [`schema`] - Entity descriptors and records
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementation

pub mod alias;
pub mod catalog;
pub mod dialect;
pub mod dml;
pub mod error;
pub mod expr;
pub mod literal;
pub mod query;
pub mod schema;
pub mod token;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use alias::AliasBindings;
pub use dialect::{Postgres, SqlDialect};
pub use dml::{DeleteAll, DeleteOne, Insert, UpdateAll, UpdateOne};
pub use error::{CompileError, CompileResult};
pub use expr::{
    array, call, field, lit, lit_null, now, range, source, Expr, ExprExt, Scope, Truncation,
};
pub use literal::{Interval, Literal};
pub use query::{
    Distinct, Join, JoinKind, Lock, OrderByExpr, Query, SortDir, Source,
};
pub use schema::{EntityDescriptor, EntityInstance, ModelDescriptor, Record, Schema};
pub use token::{Token, TokenStream};
pub use types::ValueType;
