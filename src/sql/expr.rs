//! Expression AST - the core of SQL expression building.
//!
//! This module provides a closed AST for query expressions with exhaustive
//! pattern matching enforced by the compiler. Expressions reference tables
//! only by source position; the names they render with come from the
//! [`Scope`] they are compiled in.

use serde::{Deserialize, Serialize};

use super::alias::AliasBindings;
use super::catalog::{self, CallRule, Rendering};
use super::error::{check_depth, CompileError, CompileResult};
use super::literal::{self, Literal};
use super::query::Source;
use super::token::{Token, TokenStream};
use super::types::ValueType;

// =============================================================================
// Expression AST
// =============================================================================

/// A query expression.
///
/// Every variant must be handled in `write()` - the compiler enforces this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Field of a bound source: `"u0"."name"`
    Field { source: usize, field: String },

    /// Every field of a bound source, in entity order.
    Source(usize),

    /// Logical negation: `NOT (expr)`
    Not(Box<Expr>),

    /// Equality or inequality. A null literal on either side turns this
    /// into `IS [NOT] NULL`.
    Equals {
        left: Box<Expr>,
        right: Box<Expr>,
        #[serde(default)]
        negated: bool,
    },

    /// Membership: `BETWEEN` against a [`Expr::Range`], `= ANY (...)` otherwise.
    In { left: Box<Expr>, right: Box<Expr> },

    /// Contiguous range. Only valid as the right-hand side of [`Expr::In`].
    Range { first: Box<Expr>, last: Box<Expr> },

    /// Non-truncating division: `left / right::numeric`
    Div { left: Box<Expr>, right: Box<Expr> },

    /// Date or time part of a timestamp: `expr::date`
    Truncate { unit: Truncation, expr: Box<Expr> },

    /// Operator or function call, resolved through the catalog.
    Call {
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
    },

    /// Literal value
    Literal(Literal),

    /// Array built from expressions: `ARRAY[...]`
    Array {
        elements: Vec<Expr>,
        element_type: ValueType,
    },
}

/// Target of a truncation cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Truncation {
    Date,
    Time,
}

impl Truncation {
    fn value_type(self) -> ValueType {
        match self {
            Truncation::Date => ValueType::Date,
            Truncation::Time => ValueType::Time,
        }
    }
}

// =============================================================================
// Compilation Scope
// =============================================================================

/// Everything an expression needs to be rendered inside one statement.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub sources: &'a [Source],
    pub aliases: &'a AliasBindings,
    /// Deepest expression nesting accepted before failing.
    pub max_depth: usize,
}

impl<'a> Scope<'a> {
    pub fn new(sources: &'a [Source], aliases: &'a AliasBindings, max_depth: usize) -> Self {
        Self {
            sources,
            aliases,
            max_depth,
        }
    }

    /// Alias and descriptor of the source at `index`.
    pub(crate) fn source(&self, index: usize) -> CompileResult<(&'a str, &'a Source)> {
        let alias = self.aliases.get(index)?;
        let source = self
            .sources
            .get(index)
            .ok_or(CompileError::OutOfRangeSourceReference {
                index,
                len: self.sources.len(),
            })?;
        Ok((alias, source))
    }
}

// =============================================================================
// Rendering
// =============================================================================

impl Expr {
    /// Convert this expression to a token stream.
    pub fn to_tokens(&self, scope: &Scope<'_>) -> CompileResult<TokenStream> {
        let mut ts = TokenStream::new();
        self.write(scope, 0, &mut ts)?;
        Ok(ts)
    }

    /// Binary operator expressions get parenthesized when nested.
    fn is_binary(&self) -> bool {
        match self {
            Expr::Equals { .. } | Expr::In { .. } | Expr::Div { .. } => true,
            Expr::Call { name, args } => catalog::lookup(name, args.len()).is_infix(),
            _ => false,
        }
    }

    fn write(&self, scope: &Scope<'_>, depth: usize, ts: &mut TokenStream) -> CompileResult<()> {
        let depth = depth + 1;
        check_depth(depth, scope.max_depth)?;

        match self {
            Expr::Field { source, field } => {
                let alias = scope.aliases.get(*source)?;
                write_field(ts, alias, field);
            }

            Expr::Source(index) => {
                let (alias, source) = scope.source(*index)?;
                let fields = source.entity.fields();
                if fields.is_empty() {
                    ts.push(Token::Ident(alias.to_string()))
                        .push(Token::Dot)
                        .push(Token::Star);
                }
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    write_field(ts, alias, field);
                }
            }

            Expr::Not(inner) => {
                ts.push(Token::Not).space().lparen();
                inner.write(scope, depth, ts)?;
                ts.rparen();
            }

            Expr::Equals {
                left,
                right,
                negated,
            } => {
                let null_test = match (left.as_ref(), right.as_ref()) {
                    (other, Expr::Literal(Literal::Null)) => Some(other),
                    (Expr::Literal(Literal::Null), other) => Some(other),
                    _ => None,
                };
                if let Some(other) = null_test {
                    other.write_operand(scope, depth, ts)?;
                    ts.space().push(Token::Is).space();
                    if *negated {
                        ts.push(Token::Not).space();
                    }
                    ts.push(Token::Null);
                } else {
                    left.write_operand(scope, depth, ts)?;
                    ts.space()
                        .push(if *negated { Token::NotEq } else { Token::Eq })
                        .space();
                    right.write_operand(scope, depth, ts)?;
                }
            }

            Expr::In { left, right } => {
                left.write_operand(scope, depth, ts)?;
                if let Expr::Range { first, last } = right.as_ref() {
                    ts.space().push(Token::Between).space();
                    first.write_operand(scope, depth, ts)?;
                    ts.space().push(Token::And).space();
                    last.write_operand(scope, depth, ts)?;
                } else {
                    ts.space()
                        .push(Token::Eq)
                        .space()
                        .push(Token::Any)
                        .space()
                        .lparen();
                    right.write(scope, depth, ts)?;
                    ts.rparen();
                }
            }

            Expr::Range { .. } => {
                return Err(CompileError::UnsupportedExpression(
                    "range used outside of a membership test".into(),
                ));
            }

            Expr::Div { left, right } => {
                left.write_operand(scope, depth, ts)?;
                ts.space().push(Token::Div).space();
                right.write_unary_operand(scope, depth, ts)?;
                ts.push(Token::Cast)
                    .push(Token::TypeName(ValueType::Decimal));
            }

            Expr::Truncate { unit, expr } => {
                expr.write_unary_operand(scope, depth, ts)?;
                ts.push(Token::Cast)
                    .push(Token::TypeName(unit.value_type()));
            }

            Expr::Call { name, args } => {
                write_call(scope, depth, ts, name, args)?;
            }

            Expr::Literal(lit) => {
                lit.write_tokens(ts, depth, scope.max_depth)?;
            }

            Expr::Array {
                elements,
                element_type,
            } => {
                let encoded = elements
                    .iter()
                    .map(|e| {
                        let mut element = TokenStream::new();
                        e.write(scope, depth, &mut element)?;
                        Ok(element)
                    })
                    .collect::<CompileResult<Vec<_>>>()?;
                literal::write_array(ts, &encoded, element_type);
            }
        }

        Ok(())
    }

    /// Whether the rendered text starts with a sign. Such operands cannot
    /// follow a prefix `-` (`--` opens a comment) or take a `::` suffix
    /// (the cast would bind before the sign).
    fn is_signed(&self) -> bool {
        match self {
            Expr::Call { name, args } => matches!(
                catalog::lookup(name, args.len()),
                CallRule::Catalog(Rendering::Prefix(_))
            ),
            Expr::Literal(lit) => lit.is_negative(),
            _ => false,
        }
    }

    /// Write as the operand of an operator, parenthesizing binary expressions.
    fn write_operand(
        &self,
        scope: &Scope<'_>,
        depth: usize,
        ts: &mut TokenStream,
    ) -> CompileResult<()> {
        self.write_grouped(self.is_binary(), scope, depth, ts)
    }

    /// Write as the operand of a prefix operator or a cast.
    fn write_unary_operand(
        &self,
        scope: &Scope<'_>,
        depth: usize,
        ts: &mut TokenStream,
    ) -> CompileResult<()> {
        self.write_grouped(self.is_binary() || self.is_signed(), scope, depth, ts)
    }

    fn write_grouped(
        &self,
        grouped: bool,
        scope: &Scope<'_>,
        depth: usize,
        ts: &mut TokenStream,
    ) -> CompileResult<()> {
        if grouped {
            ts.lparen();
            self.write(scope, depth, ts)?;
            ts.rparen();
            Ok(())
        } else {
            self.write(scope, depth, ts)
        }
    }
}

fn write_field(ts: &mut TokenStream, alias: &str, field: &str) {
    ts.push(Token::Ident(alias.to_string()))
        .push(Token::Dot)
        .push(Token::Ident(field.to_string()));
}

fn write_call(
    scope: &Scope<'_>,
    depth: usize,
    ts: &mut TokenStream,
    name: &str,
    args: &[Expr],
) -> CompileResult<()> {
    let function = match (catalog::lookup(name, args.len()), args) {
        (CallRule::Catalog(Rendering::Infix(op)), [left, right]) => {
            left.write_operand(scope, depth, ts)?;
            ts.space().push(Token::Operator(op)).space();
            return right.write_operand(scope, depth, ts);
        }
        (CallRule::Catalog(Rendering::Prefix(op)), [operand]) => {
            ts.push(Token::Operator(op));
            return operand.write_unary_operand(scope, depth, ts);
        }
        (CallRule::Catalog(Rendering::Keyword(keyword)), []) => {
            ts.push(Token::FunctionName(keyword.to_string()));
            return Ok(());
        }
        (CallRule::Catalog(Rendering::Function(function)), _) => function,
        (CallRule::Fallback(function), _) => function,
        (rule, _) => {
            return Err(CompileError::UnsupportedExpression(format!(
                "call {}/{} does not match {:?}",
                name,
                args.len(),
                rule
            )));
        }
    };

    ts.push(Token::FunctionName(function.to_string())).lparen();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            ts.comma().space();
        }
        arg.write(scope, depth, ts)?;
    }
    ts.rparen();
    Ok(())
}

// =============================================================================
// Expression Constructors
// =============================================================================

/// Field of the source at position `source`.
pub fn field(source: usize, name: &str) -> Expr {
    Expr::Field {
        source,
        field: name.into(),
    }
}

/// Every field of the source at position `index`.
pub fn source(index: usize) -> Expr {
    Expr::Source(index)
}

/// Literal expression.
pub fn lit(value: impl Into<Literal>) -> Expr {
    Expr::Literal(value.into())
}

/// NULL literal.
pub fn lit_null() -> Expr {
    Expr::Literal(Literal::Null)
}

/// Operator or function call.
pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call {
        name: name.into(),
        args,
    }
}

/// Contiguous range, for use with [`ExprExt::is_in`].
pub fn range(first: impl Into<Expr>, last: impl Into<Expr>) -> Expr {
    Expr::Range {
        first: Box::new(first.into()),
        last: Box::new(last.into()),
    }
}

/// Array expression with an explicit element type.
pub fn array(element_type: ValueType, elements: Vec<Expr>) -> Expr {
    Expr::Array {
        elements,
        element_type,
    }
}

/// Current timestamp, as a bare keyword.
pub fn now() -> Expr {
    call("now", vec![])
}

// =============================================================================
// Expression Builder Trait
// =============================================================================

/// Extension trait for building expressions fluently.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    // Comparison operators
    fn eq(self, other: impl Into<Expr>) -> Expr {
        Expr::Equals {
            left: Box::new(self.into_expr()),
            right: Box::new(other.into()),
            negated: false,
        }
    }

    fn ne(self, other: impl Into<Expr>) -> Expr {
        Expr::Equals {
            left: Box::new(self.into_expr()),
            right: Box::new(other.into()),
            negated: true,
        }
    }

    fn is_null(self) -> Expr {
        self.eq(lit_null())
    }

    fn is_not_null(self) -> Expr {
        self.ne(lit_null())
    }

    fn gt(self, other: impl Into<Expr>) -> Expr {
        call(">", vec![self.into_expr(), other.into()])
    }

    fn gte(self, other: impl Into<Expr>) -> Expr {
        call(">=", vec![self.into_expr(), other.into()])
    }

    fn lt(self, other: impl Into<Expr>) -> Expr {
        call("<", vec![self.into_expr(), other.into()])
    }

    fn lte(self, other: impl Into<Expr>) -> Expr {
        call("<=", vec![self.into_expr(), other.into()])
    }

    // Logical operators
    fn and(self, other: impl Into<Expr>) -> Expr {
        call("and", vec![self.into_expr(), other.into()])
    }

    fn or(self, other: impl Into<Expr>) -> Expr {
        call("or", vec![self.into_expr(), other.into()])
    }

    fn not(self) -> Expr {
        Expr::Not(Box::new(self.into_expr()))
    }

    // Arithmetic operators
    fn add(self, other: impl Into<Expr>) -> Expr {
        call("+", vec![self.into_expr(), other.into()])
    }

    fn sub(self, other: impl Into<Expr>) -> Expr {
        call("-", vec![self.into_expr(), other.into()])
    }

    fn mul(self, other: impl Into<Expr>) -> Expr {
        call("*", vec![self.into_expr(), other.into()])
    }

    fn div(self, other: impl Into<Expr>) -> Expr {
        Expr::Div {
            left: Box::new(self.into_expr()),
            right: Box::new(other.into()),
        }
    }

    // String operators
    fn like(self, pattern: impl Into<Expr>) -> Expr {
        call("like", vec![self.into_expr(), pattern.into()])
    }

    fn ilike(self, pattern: impl Into<Expr>) -> Expr {
        call("ilike", vec![self.into_expr(), pattern.into()])
    }

    fn concat(self, other: impl Into<Expr>) -> Expr {
        call("concat", vec![self.into_expr(), other.into()])
    }

    // Membership
    fn is_in(self, collection: impl Into<Expr>) -> Expr {
        Expr::In {
            left: Box::new(self.into_expr()),
            right: Box::new(collection.into()),
        }
    }

    fn between(self, first: impl Into<Expr>, last: impl Into<Expr>) -> Expr {
        self.is_in(range(first, last))
    }

    // Truncation
    fn to_date(self) -> Expr {
        Expr::Truncate {
            unit: Truncation::Date,
            expr: Box::new(self.into_expr()),
        }
    }

    fn to_time(self) -> Expr {
        Expr::Truncate {
            unit: Truncation::Time,
            expr: Box::new(self.into_expr()),
        }
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<Literal> for Expr {
    fn from(lit: Literal) -> Self {
        Expr::Literal(lit)
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        lit(n)
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        lit(n)
    }
}

impl From<f64> for Expr {
    fn from(f: f64) -> Self {
        lit(f)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        lit(s)
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        lit(s)
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        lit(b)
    }
}

// =============================================================================
// Tests
// =============================================================================
