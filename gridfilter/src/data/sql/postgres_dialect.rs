//! PostgreSQL SQL dialect implementation

use super::SqlDialect;
use super::dialect::string_literal;
use crate::utils::date_format::DateFormat;

/// PostgreSQL SQL dialect
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn like(&self, col: &str, placeholder: &str, case_insensitive: bool) -> String {
        let op = if case_insensitive { "ILIKE" } else { "LIKE" };
        format!("{} {} {} ESCAPE '\\'", col, op, placeholder)
    }

    fn cast_to_string(&self, col: &str) -> String {
        format!("{}::TEXT", col)
    }

    fn format_date(&self, col: &str, format: &DateFormat) -> Option<String> {
        Some(format!(
            "to_char({}, {})",
            col,
            string_literal(&format.to_postgres())
        ))
    }

    fn order_by_with_nulls(&self, col: &str, desc: bool, nulls_last: bool) -> String {
        let dir = if desc { "DESC" } else { "ASC" };
        let nulls = if nulls_last {
            "NULLS LAST"
        } else {
            "NULLS FIRST"
        };
        format!("{} {} {}", col, dir, nulls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.placeholder(1), "$1");
        assert_eq!(dialect.placeholder(5), "$5");
    }

    #[test]
    fn test_like_operators() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.like("name", "$1", false), r"name LIKE $1 ESCAPE '\'");
        assert_eq!(dialect.like("name", "$2", true), r"name ILIKE $2 ESCAPE '\'");
    }

    #[test]
    fn test_cast_to_string() {
        assert_eq!(PostgresDialect.cast_to_string("id"), "id::TEXT");
    }

    #[test]
    fn test_format_date() {
        let format = DateFormat::parse("Y-m-d H:i").unwrap();
        assert_eq!(
            PostgresDialect.format_date("created_at", &format),
            Some("to_char(created_at, 'YYYY-MM-DD HH24:MI')".to_string())
        );
    }

    #[test]
    fn test_order_by_with_nulls() {
        let dialect = PostgresDialect;
        assert_eq!(
            dialect.order_by_with_nulls("timestamp", true, true),
            "timestamp DESC NULLS LAST"
        );
    }
}
