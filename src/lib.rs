//! # pgquery
//!
//! SQL generation for a PostgreSQL adapter. Turns a structured query
//! description into PostgreSQL statement text.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Query / Insert / UpdateOne / DeleteAll ...        │
//! │   (sources, expressions, literals, row descriptors)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [alias allocation]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Scope (sources + bound aliases + depth limit)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [clause and expression renderers]
//! ┌─────────────────────────────────────────────────────────┐
//! │                     TokenStream                          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [dialect serialization]
//! ┌─────────────────────────────────────────────────────────┐
//! │                     SQL String                           │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is executed here: statements are returned as strings for the
//! caller to send to a database.

pub mod compile;
pub mod config;
pub mod sql;

// Re-export SQL submodules at crate level
pub use sql::dialect;
pub use sql::dml;
pub use sql::expr;
pub use sql::literal;
pub use sql::query;
pub use sql::token;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::{
        compile_delete_all, compile_delete_one, compile_insert, compile_select,
        compile_update_all, compile_update_one, CompileOptions, Compiler,
    };
    pub use crate::dialect::{Postgres, SqlDialect};
    pub use crate::dml::{DeleteAll, DeleteOne, Insert, UpdateAll, UpdateOne};
    pub use crate::expr::{
        // Constructors
        array,
        call,
        field,
        lit,
        lit_null,
        now,
        range,
        source,
        // Types
        Expr,
        ExprExt,
        Truncation,
    };
    pub use crate::literal::{Interval, Literal};
    pub use crate::query::{Distinct, JoinKind, Lock, OrderByExpr, Query, SortDir, Source};
    pub use crate::sql::error::{CompileError, CompileResult};
    pub use crate::sql::schema::{EntityDescriptor, EntityInstance, ModelDescriptor, Record, Schema};
    pub use crate::sql::types::ValueType;
}

// Also export at crate root for convenience
pub use compile::{CompileOptions, Compiler};
pub use sql::error::{CompileError, CompileResult};
pub use sql::expr::{field, lit, Expr, ExprExt};
pub use sql::query::{Query, Source};
