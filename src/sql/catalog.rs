//! Operator and function catalog.
//!
//! Maps a call's `(name, arity)` to the way it is written in SQL. The table
//! is built once on first use and only read afterwards. Names with no entry
//! fall through to a plain function call using the name verbatim, so any
//! backend function can be called without registering it first.

use std::collections::HashMap;
use std::sync::LazyLock;

/// How a catalogued call is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rendering {
    /// `<symbol><operand>`
    Prefix(&'static str),
    /// `<left> <symbol> <right>`
    Infix(&'static str),
    /// `<name>(<args>)` under a different SQL name.
    Function(&'static str),
    /// Bare keyword, no parentheses: `localtimestamp`.
    Keyword(&'static str),
}

/// Resolved rule for one call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallRule<'a> {
    Catalog(Rendering),
    /// No catalog entry: call the function by its own name.
    Fallback(&'a str),
}

impl CallRule<'_> {
    /// Whether calls resolved to this rule are binary operator expressions.
    pub fn is_infix(&self) -> bool {
        matches!(self, CallRule::Catalog(Rendering::Infix(_)))
    }
}

static CATALOG: LazyLock<HashMap<&'static str, Vec<(usize, Rendering)>>> = LazyLock::new(|| {
    use Rendering::*;

    let entries: &[(&'static str, usize, Rendering)] = &[
        // Logical
        ("and", 2, Infix("AND")),
        ("or", 2, Infix("OR")),
        // Comparison
        ("<", 2, Infix("<")),
        ("<=", 2, Infix("<=")),
        (">", 2, Infix(">")),
        (">=", 2, Infix(">=")),
        // Arithmetic
        ("+", 2, Infix("+")),
        ("-", 2, Infix("-")),
        ("*", 2, Infix("*")),
        ("rem", 2, Infix("%")),
        ("pow", 2, Infix("^")),
        ("-", 1, Prefix("-")),
        ("+", 1, Prefix("+")),
        // Strings and lists
        ("<>", 2, Infix("||")),
        ("++", 2, Infix("||")),
        ("concat", 2, Infix("||")),
        ("like", 2, Infix("LIKE")),
        ("ilike", 2, Infix("ILIKE")),
        ("downcase", 1, Function("lower")),
        ("upcase", 1, Function("upper")),
        // Date arithmetic
        ("date_add", 2, Infix("+")),
        ("date_sub", 2, Infix("-")),
        // Zero-argument calls
        ("random", 0, Function("random")),
        ("now", 0, Keyword("localtimestamp")),
        ("localtimestamp", 0, Keyword("localtimestamp")),
        ("current_date", 0, Keyword("current_date")),
    ];

    let mut map: HashMap<&'static str, Vec<(usize, Rendering)>> = HashMap::new();
    for (name, arity, rendering) in entries {
        map.entry(*name).or_default().push((*arity, *rendering));
    }
    map
});

/// Resolve how a call to `name` with `arity` arguments is rendered.
pub fn lookup(name: &str, arity: usize) -> CallRule<'_> {
    CATALOG
        .get(name)
        .and_then(|rules| rules.iter().find(|(a, _)| *a == arity))
        .map_or(CallRule::Fallback(name), |(_, rendering)| {
            CallRule::Catalog(*rendering)
        })
}
