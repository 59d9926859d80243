//! Shared helper functions for SQL dialect implementations.

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Escape-string byte literal: `'\x<hex>'`.
pub fn quote_bytes_hex(bytes: &[u8]) -> String {
    format!("'\\x{}'", hex::encode(bytes))
}

// =============================================================================
// Boolean Formatting
// =============================================================================

/// Format boolean as the upper-case keyword TRUE/FALSE.
pub fn format_bool_keyword(b: bool) -> &'static str {
    if b {
        "TRUE"
    } else {
        "FALSE"
    }
}
