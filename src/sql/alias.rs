//! Per-statement table aliases.
//!
//! Every source in a statement gets a short alias made of the first
//! character of its table name and a numeric suffix. Suffixes start at 0
//! and increase until the candidate is unused by an earlier source, so
//! `users, users, posts` binds to `u0, u1, p0`.

use super::error::{CompileError, CompileResult};

/// Aliases bound to a statement's sources, indexed by source position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasBindings {
    aliases: Vec<String>,
}

impl AliasBindings {
    /// Bind an alias to each table name, in order.
    pub fn allocate<'a>(tables: impl IntoIterator<Item = &'a str>) -> Self {
        let mut aliases: Vec<String> = Vec::new();
        for table in tables {
            let seed: String = table.chars().next().map(String::from).unwrap_or_default();
            let mut suffix = 0usize;
            let alias = loop {
                let candidate = format!("{}{}", seed, suffix);
                if !aliases.contains(&candidate) {
                    break candidate;
                }
                suffix += 1;
            };
            aliases.push(alias);
        }
        Self { aliases }
    }

    /// Alias of the source at `index`.
    pub fn get(&self, index: usize) -> CompileResult<&str> {
        self.aliases
            .get(index)
            .map(String::as_str)
            .ok_or(CompileError::OutOfRangeSourceReference {
                index,
                len: self.aliases.len(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.aliases.iter().map(String::as_str)
    }
}
