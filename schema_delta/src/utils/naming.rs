//! Naming utilities for SchemaDelta
//!
//! Table and column names are compared case-insensitively everywhere, and
//! quoted for output according to the configured dialect.

use serde::{Deserialize, Serialize};

/// Identifier quoting strategy
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStyle {
    /// `` `name` `` (MySQL, MariaDB)
    Backtick,
    /// `"name"` (PostgreSQL, ANSI)
    DoubleQuote,
    /// `[name]` (SQL Server)
    Bracket,
}

impl QuoteStyle {
    /// Enclose an identifier, doubling any closing quote inside it
    pub fn quote(self, identifier: &str) -> String {
        match self {
            QuoteStyle::Backtick => format!("`{}`", identifier.replace('`', "``")),
            QuoteStyle::DoubleQuote => format!("\"{}\"", identifier.replace('"', "\"\"")),
            QuoteStyle::Bracket => format!("[{}]", identifier.replace(']', "]]")),
        }
    }
}

/// Lookup key for a table or column name
pub fn fold_case(name: &str) -> String {
    name.to_lowercase()
}

/// Case-insensitive name equality
pub fn names_match(a: &str, b: &str) -> bool {
    fold_case(a) == fold_case(b)
}

/// Strip a literal suffix, refusing to leave an empty name behind
pub fn strip_name_suffix<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    name.strip_suffix(suffix).filter(|stripped| !stripped.is_empty())
}
