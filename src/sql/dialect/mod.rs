//! SQL dialect definitions and formatting rules.
//!
//! The compiler targets PostgreSQL-like backends. Everything that is a
//! matter of spelling rather than structure lives behind [`SqlDialect`]:
//!
//! - Identifier quoting: `"identifier"`
//! - String literals: `'it''s'`
//! - Boolean keywords: `TRUE` / `FALSE`
//! - Byte-string literals: `'\x00ff'`
//! - Type names used in casts: `text`, `bytea`, `integer[]`, ...
//!
//! # Usage
//!
//! ```ignore
//! use pgquery::dialect::{Postgres, SqlDialect};
//!
//! let quoted = Postgres.quote_identifier("user");  // "user"
//! ```

pub mod helpers;
mod postgres;

pub use postgres::Postgres;

use super::types::ValueType;

/// SQL dialect trait - defines how SQL constructs are spelled.
///
/// Implementations must be stateless so a compiler can be shared across
/// threads.
pub trait SqlDialect: std::fmt::Debug + Send + Sync {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    ///
    /// All supported dialects use single quotes with `''` for escaping.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a boolean literal.
    fn format_bool(&self, b: bool) -> &'static str;

    /// Format a NULL literal.
    fn format_null(&self) -> &'static str {
        "NULL"
    }

    /// Format a byte-string literal body (without the type cast).
    fn format_bytes(&self, bytes: &[u8]) -> String;

    // =========================================================================
    // Types
    // =========================================================================

    /// Map an abstract value type to the dialect's type name.
    fn type_name(&self, ty: &ValueType) -> String;

    /// Operator placed between a value and a type name in a cast.
    fn cast_operator(&self) -> &'static str {
        "::"
    }
}
