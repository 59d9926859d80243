//! Abstract value types.
//!
//! These are the type tags the query layer attaches to values whose SQL
//! rendering depends on an explicit cast: float literals, numeric division,
//! date/time truncation and, most importantly, empty array literals, which
//! PostgreSQL rejects unless the element type is spelled out.
//!
//! The dialect decides the concrete type name, see
//! [`SqlDialect::type_name`](super::dialect::SqlDialect::type_name).

use serde::{Deserialize, Serialize};

/// Abstract scalar (or array) type of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Boolean,
    String,
    Integer,
    Float,
    Decimal,
    Binary,
    Date,
    Time,
    Timestamp,
    Interval,
    /// Array whose elements all have the inner type.
    Array(Box<ValueType>),
}

impl ValueType {
    /// Array of the given element type.
    pub fn array_of(inner: ValueType) -> Self {
        ValueType::Array(Box::new(inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names() {
        let ty: ValueType = serde_json::from_str(r#"{"array":"string"}"#).unwrap();
        assert_eq!(ty, ValueType::array_of(ValueType::String));
        assert_eq!(serde_json::to_string(&ValueType::Timestamp).unwrap(), "\"timestamp\"");
    }
}
