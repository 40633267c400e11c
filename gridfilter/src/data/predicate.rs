//! Predicate fragments
//!
//! A [`Predicate`] is one boolean condition over a column expression with
//! bound values. Fragments nest through `And`/`Or` and render to SQL with
//! placeholders, pushing their values into [`SqlParams`] in the order the
//! placeholders appear.

use std::fmt;

use serde::Serialize;

use super::sql::SqlDialect;
use crate::utils::date_format::DateFormat;

/// A value bound to a placeholder
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Text(s) => write!(f, "{}", s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Real(r) => write!(f, "{}", r),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for SqlValue {
    fn from(r: f64) -> Self {
        Self::Real(r)
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Collects SQL parameters during query building (maintains insertion order)
#[derive(Debug, Default)]
pub struct SqlParams {
    pub values: Vec<SqlValue>,
}

impl SqlParams {
    /// Push a value and return its placeholder
    pub fn bind(&mut self, dialect: &dyn SqlDialect, value: SqlValue) -> String {
        self.values.push(value);
        dialect.placeholder(self.values.len())
    }
}

/// A concrete column: table or join alias plus field name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub alias: String,
    pub field: String,
}

impl ColumnRef {
    pub fn new(alias: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            field: field.into(),
        }
    }

    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> String {
        format!(
            "{}.{}",
            dialect.quote_ident(&self.alias),
            dialect.quote_ident(&self.field)
        )
    }
}

/// The left-hand side of a comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnExpr {
    Plain(ColumnRef),
    /// Column cast to text, for pattern matching non-text fields
    AsText(ColumnRef),
    /// Column rendered through a date format before comparing
    Date { column: ColumnRef, format: DateFormat },
}

impl ColumnExpr {
    pub fn column(&self) -> &ColumnRef {
        match self {
            Self::Plain(column) | Self::AsText(column) | Self::Date { column, .. } => column,
        }
    }

    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> String {
        match self {
            Self::Plain(column) => column.to_sql(dialect),
            Self::AsText(column) => dialect.cast_to_string(&column.to_sql(dialect)),
            Self::Date { column, format } => {
                let col = column.to_sql(dialect);
                dialect.format_date(&col, format).unwrap_or(col)
            }
        }
    }
}

impl From<ColumnRef> for ColumnExpr {
    fn from(column: ColumnRef) -> Self {
        Self::Plain(column)
    }
}

/// Boolean condition tree
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals {
        column: ColumnExpr,
        value: SqlValue,
    },
    Like {
        column: ColumnExpr,
        pattern: String,
        case_insensitive: bool,
    },
    /// Inclusive on both bounds
    Between {
        column: ColumnExpr,
        min: SqlValue,
        max: SqlValue,
    },
    In {
        column: ColumnExpr,
        values: Vec<SqlValue>,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn equals(column: impl Into<ColumnExpr>, value: impl Into<SqlValue>) -> Self {
        Self::Equals {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn between(
        column: impl Into<ColumnExpr>,
        min: impl Into<SqlValue>,
        max: impl Into<SqlValue>,
    ) -> Self {
        Self::Between {
            column: column.into(),
            min: min.into(),
            max: max.into(),
        }
    }

    /// Generate SQL WHERE clause fragment
    /// Returns the SQL clause with placeholders and updates params
    pub fn to_sql(&self, dialect: &dyn SqlDialect, params: &mut SqlParams) -> String {
        match self {
            Self::Equals { column, value } => {
                let col = column.to_sql(dialect);
                let ph = params.bind(dialect, value.clone());
                format!("{} = {}", col, ph)
            }
            Self::Like {
                column,
                pattern,
                case_insensitive,
            } => {
                let col = column.to_sql(dialect);
                let ph = params.bind(dialect, SqlValue::Text(pattern.clone()));
                dialect.like(&col, &ph, *case_insensitive)
            }
            Self::Between { column, min, max } => {
                let col = column.to_sql(dialect);
                let min_ph = params.bind(dialect, min.clone());
                let max_ph = params.bind(dialect, max.clone());
                format!("{} BETWEEN {} AND {}", col, min_ph, max_ph)
            }
            Self::In { column, values } => {
                if values.is_empty() {
                    return "1=0".to_string();
                }
                let col = column.to_sql(dialect);
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| params.bind(dialect, v.clone()))
                    .collect();
                format!("{} IN ({})", col, placeholders.join(", "))
            }
            Self::And(parts) => Self::join(parts, " AND ", "1=1", dialect, params),
            Self::Or(parts) => Self::join(parts, " OR ", "1=0", dialect, params),
        }
    }

    fn join(
        parts: &[Predicate],
        separator: &str,
        empty: &str,
        dialect: &dyn SqlDialect,
        params: &mut SqlParams,
    ) -> String {
        match parts {
            [] => empty.to_string(),
            [single] => single.to_sql(dialect, params),
            _ => {
                let rendered: Vec<String> =
                    parts.iter().map(|p| p.to_sql(dialect, params)).collect();
                format!("({})", rendered.join(separator))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sql::{PostgresDialect, SqliteDialect};

    fn name() -> ColumnRef {
        ColumnRef::new("users", "name")
    }

    #[test]
    fn equals_binds_value() {
        let mut params = SqlParams::default();
        let sql = Predicate::equals(name(), "Ada").to_sql(&SqliteDialect, &mut params);

        assert_eq!(sql, r#""users"."name" = ?"#);
        assert_eq!(params.values, vec![SqlValue::from("Ada")]);
    }

    #[test]
    fn like_renders_escape_clause() {
        let predicate = Predicate::Like {
            column: name().into(),
            pattern: "%ada%".to_string(),
            case_insensitive: true,
        };
        let mut params = SqlParams::default();
        let sql = predicate.to_sql(&PostgresDialect, &mut params);

        assert_eq!(sql, r#""users"."name" ILIKE $1 ESCAPE '\'"#);
        assert_eq!(params.values, vec![SqlValue::from("%ada%")]);
    }

    #[test]
    fn between_binds_both_bounds_in_order() {
        let predicate = Predicate::between(ColumnRef::new("users", "id"), 4i64, 9i64);
        let mut params = SqlParams::default();
        let sql = predicate.to_sql(&PostgresDialect, &mut params);

        assert_eq!(sql, r#""users"."id" BETWEEN $1 AND $2"#);
        assert_eq!(
            params.values,
            vec![SqlValue::Integer(4), SqlValue::Integer(9)]
        );
    }

    #[test]
    fn in_list_and_empty_in_list() {
        let mut params = SqlParams::default();
        let predicate = Predicate::In {
            column: name().into(),
            values: vec!["a".into(), "b".into()],
        };
        assert_eq!(
            predicate.to_sql(&SqliteDialect, &mut params),
            r#""users"."name" IN (?, ?)"#
        );

        let empty = Predicate::In {
            column: name().into(),
            values: vec![],
        };
        assert_eq!(empty.to_sql(&SqliteDialect, &mut params), "1=0");
        assert_eq!(params.values.len(), 2);
    }

    #[test]
    fn or_group_is_parenthesized() {
        let predicate = Predicate::Or(vec![
            Predicate::equals(name(), "a"),
            Predicate::equals(ColumnRef::new("users", "nick"), "a"),
        ]);
        let mut params = SqlParams::default();

        assert_eq!(
            predicate.to_sql(&PostgresDialect, &mut params),
            r#"("users"."name" = $1 OR "users"."nick" = $2)"#
        );
    }

    #[test]
    fn single_member_groups_collapse() {
        let predicate = Predicate::And(vec![Predicate::Or(vec![Predicate::equals(name(), "a")])]);
        let mut params = SqlParams::default();

        assert_eq!(
            predicate.to_sql(&SqliteDialect, &mut params),
            r#""users"."name" = ?"#
        );
    }

    #[test]
    fn empty_groups() {
        let mut params = SqlParams::default();
        assert_eq!(
            Predicate::And(vec![]).to_sql(&SqliteDialect, &mut params),
            "1=1"
        );
        assert_eq!(
            Predicate::Or(vec![]).to_sql(&SqliteDialect, &mut params),
            "1=0"
        );
    }

    #[test]
    fn column_expressions() {
        let id = ColumnRef::new("users", "id");
        assert_eq!(
            ColumnExpr::AsText(id.clone()).to_sql(&SqliteDialect),
            r#"CAST("users"."id" AS TEXT)"#
        );
        assert_eq!(
            ColumnExpr::AsText(id).to_sql(&PostgresDialect),
            r#""users"."id"::TEXT"#
        );

        let date = ColumnExpr::Date {
            column: ColumnRef::new("users", "created_at"),
            format: DateFormat::parse("Y-m-d").unwrap(),
        };
        assert_eq!(
            date.to_sql(&SqliteDialect),
            r#"strftime('%Y-%m-%d', "users"."created_at")"#
        );
    }
}
