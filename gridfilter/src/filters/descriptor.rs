//! Request descriptor types
//!
//! Immutable view of one grid request: which columns exist and are
//! searchable, the free-text search, explicit equality filters and value
//! intervals. Built by [`super::parser`] and consumed by the compiler.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::data::SqlValue;

/// A column of the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Logical column path, dotted for relation fields (`relation.name`)
    pub data: String,
    pub searchable: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum ComparisonOperator {
    #[default]
    #[serde(rename = "LIKE", alias = "like")]
    Like,
    /// Case-insensitive LIKE. SQLite has no ILIKE and renders plain LIKE,
    /// which folds case for ASCII letters only.
    #[serde(rename = "ILIKE", alias = "ilike")]
    ILike,
    #[serde(rename = "=", alias = "equals")]
    Equals,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchMode {
    #[default]
    Full,
    StartsWith,
    EndsWith,
}

impl SearchMode {
    /// Wrap an already escaped term in LIKE wildcards
    pub fn pattern(self, escaped: &str) -> String {
        match self {
            Self::Full => format!("%{}%", escaped),
            Self::StartsWith => format!("{}%", escaped),
            Self::EndsWith => format!("%{}", escaped),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchMeta {
    pub term: Option<String>,
    /// `None` falls back to the configured default operator
    pub operator: Option<ComparisonOperator>,
    pub mode: SearchMode,
}

impl SearchMeta {
    /// The search term, if it is non-blank
    pub fn trimmed_term(&self) -> Option<&str> {
        self.term
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

/// A single JSON scalar
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl ScalarValue {
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Real(r) => write!(f, "{}", r),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&ScalarValue> for SqlValue {
    fn from(value: &ScalarValue) -> Self {
        match value {
            ScalarValue::Bool(b) => SqlValue::Bool(*b),
            ScalarValue::Integer(i) => SqlValue::Integer(*i),
            ScalarValue::Real(r) => SqlValue::Real(*r),
            ScalarValue::Text(s) => SqlValue::Text(s.clone()),
        }
    }
}

/// Value of an explicit filter entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    List(Vec<ScalarValue>),
    Scalar(ScalarValue),
}

impl FilterValue {
    /// Null, blank and lists without a non-blank item carry no constraint
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::List(values) => values.iter().all(ScalarValue::is_blank),
            Self::Scalar(value) => value.is_blank(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalSpec {
    #[serde(default)]
    pub min: Option<ScalarValue>,
    #[serde(default)]
    pub max: Option<ScalarValue>,
    /// Storage format of the column, e.g. `Y-m-d`
    #[serde(default)]
    pub db_date_format: Option<String>,
    /// Presentation format of `min`/`max`, e.g. `Y-m-d H:i:s`
    #[serde(default)]
    pub date_format: Option<String>,
}

impl IntervalSpec {
    /// Both date formats present and non-blank
    pub fn date_formats(&self) -> Option<(&str, &str)> {
        fn present(format: &Option<String>) -> Option<&str> {
            format.as_deref().filter(|s| !s.trim().is_empty())
        }
        Some((present(&self.date_format)?, present(&self.db_date_format)?))
    }

    pub fn is_date(&self) -> bool {
        self.date_formats().is_some()
    }

    /// Both bounds, when each is present and non-blank
    pub fn bounds(&self) -> Option<(&ScalarValue, &ScalarValue)> {
        fn present(value: &Option<ScalarValue>) -> Option<&ScalarValue> {
            value.as_ref().filter(|v| !v.is_blank())
        }
        Some((present(&self.min)?, present(&self.max)?))
    }
}

/// Entity key → field → value
pub type EntityMap<T> = BTreeMap<String, BTreeMap<String, T>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Descriptor {
    /// Columns in request order, keyed by column name
    pub columns: Vec<(String, Column)>,
    pub search: SearchMeta,
    pub filters: EntityMap<FilterValue>,
    pub intervals: EntityMap<IntervalSpec>,
}

impl Descriptor {
    pub fn searchable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .map(|(_, column)| column)
            .filter(|column| column.searchable)
    }

    /// Number of filter and interval entries across all entities
    pub fn entry_count(&self) -> usize {
        self.filters.values().map(BTreeMap::len).sum::<usize>()
            + self.intervals.values().map(BTreeMap::len).sum::<usize>()
    }
}
