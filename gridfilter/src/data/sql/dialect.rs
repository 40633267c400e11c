//! SQL dialect trait for multi-database support
//!
//! This trait defines the interface for generating database-specific SQL syntax.

use crate::utils::date_format::DateFormat;
use crate::utils::sql::quote_identifier;

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1)
/// - Case-insensitive pattern matching
/// - Date formatting
/// - Type casting
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - SQLite: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    fn placeholder(&self, index: usize) -> String;

    /// Quote a table, alias or column identifier
    fn quote_ident(&self, ident: &str) -> String {
        quote_identifier(ident)
    }

    /// Generate a LIKE comparison with `\` as escape character
    ///
    /// - SQLite: `col LIKE ?` (ASCII case folding is built in)
    /// - PostgreSQL: `col LIKE $1` / `col ILIKE $1`
    fn like(&self, col: &str, placeholder: &str, case_insensitive: bool) -> String;

    /// Generate LIMIT/OFFSET clause
    ///
    /// Most databases use `LIMIT x OFFSET y`, but syntax may vary.
    fn limit_offset(&self, limit: u32, offset: u32) -> String {
        format!("LIMIT {} OFFSET {}", limit, offset)
    }

    /// Cast a column to string type
    ///
    /// - SQLite: `CAST(col AS TEXT)`
    /// - PostgreSQL: `col::TEXT`
    fn cast_to_string(&self, col: &str) -> String;

    /// Render a column through a date format
    ///
    /// - SQLite: `strftime('%Y-%m-%d', col)`
    /// - PostgreSQL: `to_char(col, 'YYYY-MM-DD')`
    ///
    /// Returns `None` when the backend cannot express the format.
    fn format_date(&self, col: &str, format: &DateFormat) -> Option<String>;

    /// Generate ORDER BY clause with NULL handling
    ///
    /// - PostgreSQL: `col DESC NULLS LAST`
    /// - SQLite: Doesn't support NULLS FIRST/LAST
    fn order_by_with_nulls(&self, col: &str, desc: bool, nulls_last: bool) -> String;
}

/// Escape a value for use inside a single-quoted SQL string literal
pub(crate) fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
