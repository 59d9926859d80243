//! SQL Tokens - the atomic units of SQL output.
//!
//! Tokens are dialect-agnostic representations that serialize
//! to dialect-specific strings.

use rust_decimal::Decimal;

use super::dialect::SqlDialect;
use super::types::ValueType;

/// SQL Token - every element the compiler can emit.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    Select,
    Distinct,
    On,
    From,
    As,
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Where,
    And,
    GroupBy,
    Having,
    OrderBy,
    Desc,
    Limit,
    Offset,
    ForUpdate,
    Not,
    Is,
    Null,
    Between,
    Any,
    Array,

    // === DML Keywords ===
    Insert,
    Into,
    Values,
    Default,
    Returning,
    Update,
    Set,
    Delete,

    // === Punctuation ===
    Comma,
    Dot,
    Star,
    LParen,
    RParen,
    LBracket,
    RBracket,
    /// Type cast operator (`::` in PostgreSQL).
    Cast,

    // === Operators ===
    Eq,
    NotEq,
    Div,
    /// Catalog operator spelled verbatim (`<=`, `||`, `ILIKE`, ...).
    Operator(&'static str),

    // === Whitespace / Formatting ===
    Space,
    Newline,

    // === Dynamic Content ===
    /// Simple identifier (table, column, alias)
    Ident(String),
    /// Integer literal
    LitInt(i64),
    /// Row count (LIMIT / OFFSET)
    LitUnsigned(u64),
    /// Float literal (shortest round-trip form)
    LitFloat(f64),
    /// Exact decimal literal, always written with a decimal point
    LitDecimal(Decimal),
    /// String literal
    LitString(String),
    /// Boolean literal
    LitBool(bool),
    /// NULL literal
    LitNull,
    /// Byte-string literal body
    LitBytes(Vec<u8>),
    /// Keyword-prefixed literal: `date '2024-01-31'`
    TypedLiteral { keyword: &'static str, text: String },
    /// Type name used after a cast operator
    TypeName(ValueType),

    // === Function Names ===
    /// Function name, rendered verbatim.
    FunctionName(String),

    // === Escape Hatch ===
    /// Raw SQL passed directly to output without escaping.
    ///
    /// # Security Warning
    ///
    /// **Never pass user input to this variant.** Raw SQL is not sanitized.
    /// It exists for caller-provided lock clauses such as `FOR SHARE`.
    Raw(String),
}

impl Token {
    /// Serialize this token to a string for the given dialect.
    pub fn serialize(&self, dialect: &dyn SqlDialect) -> String {
        match self {
            // Keywords
            Token::Select => "SELECT".into(),
            Token::Distinct => "DISTINCT".into(),
            Token::On => "ON".into(),
            Token::From => "FROM".into(),
            Token::As => "AS".into(),
            Token::Join => "JOIN".into(),
            Token::Inner => "INNER".into(),
            Token::Left => "LEFT".into(),
            Token::Right => "RIGHT".into(),
            Token::Full => "FULL".into(),
            Token::Outer => "OUTER".into(),
            Token::Where => "WHERE".into(),
            Token::And => "AND".into(),
            Token::GroupBy => "GROUP BY".into(),
            Token::Having => "HAVING".into(),
            Token::OrderBy => "ORDER BY".into(),
            Token::Desc => "DESC".into(),
            Token::Limit => "LIMIT".into(),
            Token::Offset => "OFFSET".into(),
            Token::ForUpdate => "FOR UPDATE".into(),
            Token::Not => "NOT".into(),
            Token::Is => "IS".into(),
            Token::Null => "NULL".into(),
            Token::Between => "BETWEEN".into(),
            Token::Any => "ANY".into(),
            Token::Array => "ARRAY".into(),

            // DML keywords
            Token::Insert => "INSERT".into(),
            Token::Into => "INTO".into(),
            Token::Values => "VALUES".into(),
            Token::Default => "DEFAULT".into(),
            Token::Returning => "RETURNING".into(),
            Token::Update => "UPDATE".into(),
            Token::Set => "SET".into(),
            Token::Delete => "DELETE".into(),

            // Punctuation
            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::Star => "*".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::LBracket => "[".into(),
            Token::RBracket => "]".into(),
            Token::Cast => dialect.cast_operator().into(),

            // Operators
            Token::Eq => "=".into(),
            Token::NotEq => "!=".into(),
            Token::Div => "/".into(),
            Token::Operator(op) => (*op).into(),

            // Whitespace
            Token::Space => " ".into(),
            Token::Newline => "\n".into(),

            // Dynamic - dialect-specific formatting
            Token::Ident(name) => dialect.quote_identifier(name),
            Token::LitInt(n) => n.to_string(),
            Token::LitUnsigned(n) => n.to_string(),
            Token::LitFloat(f) => {
                let mut buffer = ryu::Buffer::new();
                buffer.format(*f).to_string()
            }
            Token::LitDecimal(d) => {
                let text = d.to_string();
                if text.contains('.') {
                    text
                } else {
                    format!("{}.0", text)
                }
            }
            Token::LitString(s) => dialect.quote_string(s),
            Token::LitBool(b) => dialect.format_bool(*b).into(),
            Token::LitNull => dialect.format_null().into(),
            Token::LitBytes(bytes) => dialect.format_bytes(bytes),
            Token::TypedLiteral { keyword, text } => {
                format!("{} {}", keyword, dialect.quote_string(text))
            }
            Token::TypeName(ty) => dialect.type_name(ty),

            Token::FunctionName(name) => name.clone(),

            // Escape hatch
            Token::Raw(s) => s.clone(),
        }
    }
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    /// Append `items` separated by `, `.
    pub fn comma_separated<'a>(
        &mut self,
        items: impl IntoIterator<Item = &'a TokenStream>,
    ) -> &mut Self {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.comma().space();
            }
            self.append(item);
        }
        self
    }

    /// Serialize all tokens to a SQL string.
    pub fn serialize(&self, dialect: &dyn SqlDialect) -> String {
        self.tokens.iter().map(|t| t.serialize(dialect)).collect()
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
}
