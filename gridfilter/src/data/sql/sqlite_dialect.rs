//! SQLite SQL dialect implementation

use super::SqlDialect;
use super::dialect::string_literal;
use crate::utils::date_format::DateFormat;

/// SQLite SQL dialect
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn like(&self, col: &str, placeholder: &str, _case_insensitive: bool) -> String {
        // no ILIKE: LIKE folds ASCII case only, non-ASCII letters compare exactly
        format!("{} LIKE {} ESCAPE '\\'", col, placeholder)
    }

    fn cast_to_string(&self, col: &str) -> String {
        format!("CAST({} AS TEXT)", col)
    }

    fn format_date(&self, col: &str, format: &DateFormat) -> Option<String> {
        let pattern = format.to_sqlite()?;
        Some(format!("strftime({}, {})", string_literal(&pattern), col))
    }

    fn order_by_with_nulls(&self, col: &str, desc: bool, nulls_last: bool) -> String {
        // SQLite doesn't support NULLS FIRST/LAST, emulate with CASE
        let dir = if desc { "DESC" } else { "ASC" };
        if nulls_last {
            format!(
                "CASE WHEN {} IS NULL THEN 1 ELSE 0 END, {} {}",
                col, col, dir
            )
        } else {
            format!(
                "CASE WHEN {} IS NULL THEN 0 ELSE 1 END, {} {}",
                col, col, dir
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.placeholder(1), "?");
        assert_eq!(dialect.placeholder(5), "?");
    }

    #[test]
    fn test_like_ignores_case_flag() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.like("name", "?", false), r"name LIKE ? ESCAPE '\'");
        assert_eq!(dialect.like("name", "?", true), r"name LIKE ? ESCAPE '\'");
    }

    #[test]
    fn test_format_date() {
        let dialect = SqliteDialect;
        let format = DateFormat::parse("Y-m-d").unwrap();
        assert_eq!(
            dialect.format_date("created_at", &format),
            Some("strftime('%Y-%m-%d', created_at)".to_string())
        );
    }

    #[test]
    fn test_format_date_unsupported() {
        let dialect = SqliteDialect;
        let format = DateFormat::parse("j F Y").unwrap();
        assert_eq!(dialect.format_date("created_at", &format), None);
    }

    #[test]
    fn test_order_by_with_nulls() {
        let dialect = SqliteDialect;
        assert_eq!(
            dialect.order_by_with_nulls("timestamp", true, true),
            "CASE WHEN timestamp IS NULL THEN 1 ELSE 0 END, timestamp DESC"
        );
        assert_eq!(
            dialect.order_by_with_nulls("name", false, false),
            "CASE WHEN name IS NULL THEN 0 ELSE 1 END, name ASC"
        );
    }
}
