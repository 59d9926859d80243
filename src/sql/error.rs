//! Compilation errors.
//!
//! Every error is terminal for the statement being compiled: the compiler
//! never hands back partial SQL text.

/// Result type for SQL compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Errors raised while turning a query or descriptor into SQL.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    /// An expression shape with no rendering rule.
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// A literal value with no SQL encoding.
    #[error("Unsupported literal: {0}")]
    UnsupportedLiteral(String),

    /// A positional source reference outside the bound alias list.
    #[error("Source reference {index} is out of range ({len} sources bound)")]
    OutOfRangeSourceReference { index: usize, len: usize },

    /// Expression nesting deeper than the configured limit.
    #[error("Expression nesting exceeds the limit of {limit}")]
    DepthExceeded { limit: usize },

    /// An UPDATE with nothing to assign.
    #[error("No assignments given for update of \"{table}\"")]
    EmptyAssignments { table: String },

    /// A keyed statement for an entity without a primary key (or value).
    #[error("Entity \"{table}\" has no primary key value")]
    MissingPrimaryKey { table: String },
}

/// Fail with [`CompileError::DepthExceeded`] once `depth` passes `limit`.
pub(crate) fn check_depth(depth: usize, limit: usize) -> CompileResult<()> {
    if depth > limit {
        return Err(CompileError::DepthExceeded { limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CompileError::OutOfRangeSourceReference { index: 3, len: 2 };
        assert_eq!(
            err.to_string(),
            "Source reference 3 is out of range (2 sources bound)"
        );

        let err = CompileError::EmptyAssignments {
            table: "users".into(),
        };
        assert_eq!(err.to_string(), "No assignments given for update of \"users\"");
    }

    #[test]
    fn test_check_depth() {
        assert!(check_depth(3, 3).is_ok());
        assert_eq!(
            check_depth(4, 3).unwrap_err(),
            CompileError::DepthExceeded { limit: 3 }
        );
    }
}
