//! Literal values and their SQL encoding.
//!
//! Every runtime value the compiler can embed in a statement is a
//! [`Literal`]. Encoding is total over the closed variant set except for
//! floating-point values that have no SQL spelling (NaN and infinities),
//! which fail with [`CompileError::UnsupportedLiteral`].
//!
//! Array literals count toward the expression depth limit: each level of
//! nesting is one level of depth.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{check_depth, CompileError, CompileResult};
use super::token::{Token, TokenStream};
use super::types::ValueType;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A compile-time-known value with a defined SQL encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Null,
    Bool(bool),
    String(String),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Binary(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Interval(Interval),
    /// Array literal. The element type is carried explicitly so an empty
    /// array can still be cast to the right array type.
    Array {
        elements: Vec<Literal>,
        element_type: ValueType,
    },
}

/// Calendar interval split into its components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Interval {
    pub years: i32,
    pub months: i32,
    pub days: i32,
    pub hours: i32,
    pub minutes: i32,
    pub seconds: i32,
}

impl Interval {
    pub fn new(years: i32, months: i32, days: i32, hours: i32, minutes: i32, seconds: i32) -> Self {
        Self {
            years,
            months,
            days,
            hours,
            minutes,
            seconds,
        }
    }

    /// ISO-8601 "alternative format" duration text: `P1-2-3T4:5:6`.
    ///
    /// Components are written unpadded.
    pub fn iso8601(&self) -> String {
        format!(
            "P{}-{}-{}T{}:{}:{}",
            self.years, self.months, self.days, self.hours, self.minutes, self.seconds
        )
    }
}

impl Literal {
    /// Array literal of the given element type.
    pub fn array(element_type: ValueType, elements: impl IntoIterator<Item = Literal>) -> Self {
        Literal::Array {
            elements: elements.into_iter().collect(),
            element_type,
        }
    }

    /// Binary blob literal.
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Literal::Binary(bytes.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// Whether the encoded text starts with a minus sign.
    pub(crate) fn is_negative(&self) -> bool {
        match self {
            Literal::Integer(n) => *n < 0,
            Literal::Float(f) => f.is_sign_negative(),
            Literal::Decimal(d) => d.is_sign_negative(),
            _ => false,
        }
    }

    /// Encode this literal as SQL tokens, nesting arrays at most
    /// `max_depth` levels deep.
    pub fn to_tokens(&self, max_depth: usize) -> CompileResult<TokenStream> {
        check_depth(1, max_depth)?;
        let mut ts = TokenStream::new();
        self.write_tokens(&mut ts, 1, max_depth)?;
        Ok(ts)
    }

    /// Write at `depth`, which the caller has already checked.
    pub(crate) fn write_tokens(
        &self,
        ts: &mut TokenStream,
        depth: usize,
        max_depth: usize,
    ) -> CompileResult<()> {
        match self {
            Literal::Null => {
                ts.push(Token::LitNull);
            }
            Literal::Bool(b) => {
                ts.push(Token::LitBool(*b));
            }
            Literal::String(s) => {
                ts.push(Token::LitString(s.clone()));
            }
            Literal::Integer(n) => {
                ts.push(Token::LitInt(*n));
            }
            Literal::Float(f) => {
                if !f.is_finite() {
                    return Err(CompileError::UnsupportedLiteral(format!(
                        "float value {} has no SQL representation",
                        f
                    )));
                }
                ts.push(Token::LitFloat(*f))
                    .push(Token::Cast)
                    .push(Token::TypeName(ValueType::Float));
            }
            Literal::Decimal(d) => {
                ts.push(Token::LitDecimal(*d));
            }
            Literal::Binary(bytes) => {
                ts.push(Token::LitBytes(bytes.clone()))
                    .push(Token::Cast)
                    .push(Token::TypeName(ValueType::Binary));
            }
            Literal::Date(date) => {
                ts.push(Token::TypedLiteral {
                    keyword: "date",
                    text: date.format(DATE_FORMAT).to_string(),
                });
            }
            Literal::Time(time) => {
                ts.push(Token::TypedLiteral {
                    keyword: "time",
                    text: time.format(TIME_FORMAT).to_string(),
                });
            }
            Literal::Timestamp(ts_value) => {
                ts.push(Token::TypedLiteral {
                    keyword: "timestamp",
                    text: ts_value.format(TIMESTAMP_FORMAT).to_string(),
                });
            }
            Literal::Interval(interval) => {
                ts.push(Token::TypedLiteral {
                    keyword: "interval",
                    text: interval.iso8601(),
                });
            }
            Literal::Array {
                elements,
                element_type,
            } => {
                check_depth(depth + 1, max_depth)?;
                let encoded = elements
                    .iter()
                    .map(|e| {
                        let mut element = TokenStream::new();
                        e.write_tokens(&mut element, depth + 1, max_depth)?;
                        Ok(element)
                    })
                    .collect::<CompileResult<Vec<_>>>()?;
                write_array(ts, &encoded, element_type);
            }
        }
        Ok(())
    }
}

/// Write `ARRAY[e1, e2, ...]`, casting to `<element_type>[]` when empty.
///
/// Shared by runtime array values and structural array expressions.
pub(crate) fn write_array(ts: &mut TokenStream, elements: &[TokenStream], element_type: &ValueType) {
    ts.push(Token::Array).push(Token::LBracket);
    ts.comma_separated(elements);
    ts.push(Token::RBracket);
    if elements.is_empty() {
        ts.push(Token::Cast)
            .push(Token::TypeName(ValueType::array_of(element_type.clone())));
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Integer(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Integer(n as i64)
    }
}

impl From<f64> for Literal {
    fn from(f: f64) -> Self {
        Literal::Float(f)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<Decimal> for Literal {
    fn from(d: Decimal) -> Self {
        Literal::Decimal(d)
    }
}

impl From<NaiveDate> for Literal {
    fn from(d: NaiveDate) -> Self {
        Literal::Date(d)
    }
}

impl From<NaiveTime> for Literal {
    fn from(t: NaiveTime) -> Self {
        Literal::Time(t)
    }
}

impl From<NaiveDateTime> for Literal {
    fn from(t: NaiveDateTime) -> Self {
        Literal::Timestamp(t)
    }
}

impl From<Interval> for Literal {
    fn from(i: Interval) -> Self {
        Literal::Interval(i)
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(value: Option<T>) -> Self {
        value.map_or(Literal::Null, Into::into)
    }
}
