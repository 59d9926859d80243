//! PostgreSQL SQL dialect.
//!
//! PostgreSQL features used by the compiler:
//! - ANSI identifier quoting (`"`)
//! - `::type` casts
//! - Escape-string byte literals (`'\x..'::bytea`)
//! - `ARRAY[...]` constructors and `= ANY (...)`
//! - DISTINCT ON
//! - RETURNING clause

use super::helpers;
use super::SqlDialect;
use crate::sql::types::ValueType;

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_keyword(b)
    }

    fn format_bytes(&self, bytes: &[u8]) -> String {
        helpers::quote_bytes_hex(bytes)
    }

    fn type_name(&self, ty: &ValueType) -> String {
        match ty {
            ValueType::Boolean => "boolean".into(),
            ValueType::String => "text".into(),
            ValueType::Integer => "integer".into(),
            ValueType::Float => "float".into(),
            ValueType::Decimal => "numeric".into(),
            ValueType::Binary => "bytea".into(),
            ValueType::Date => "date".into(),
            ValueType::Time => "time".into(),
            ValueType::Timestamp => "timestamp".into(),
            ValueType::Interval => "interval".into(),
            ValueType::Array(inner) => format!("{}[]", self.type_name(inner)),
        }
    }
}
