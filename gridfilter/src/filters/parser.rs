//! Descriptor parsing
//!
//! Parses request JSON into a [`Descriptor`] with size validation. The
//! request layer may send `columns` keyed by name or as a list, and empty
//! sections as `[]`; both shapes are accepted.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::config::DescriptorLimits;
use super::descriptor::{
    Column, ComparisonOperator, Descriptor, EntityMap, FilterValue, IntervalSpec, ScalarValue,
    SearchMeta, SearchMode,
};
use super::error::FilterError;

#[derive(Debug, Default, Deserialize)]
struct RawDescriptor {
    #[serde(default, deserialize_with = "lenient")]
    columns: RawColumns,
    #[serde(default, deserialize_with = "lenient")]
    meta: RawMeta,
    #[serde(default, deserialize_with = "lenient")]
    filters: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "lenient")]
    intervals: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawColumns {
    List(Vec<RawColumn>),
    Keyed(serde_json::Map<String, Value>),
}

impl Default for RawColumns {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawColumn {
    name: Option<String>,
    data: Option<String>,
    searchable: bool,
    #[serde(deserialize_with = "lenient")]
    meta: RawColumnMeta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawColumnMeta {
    searchable: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawMeta {
    search: Option<ScalarValue>,
    comparison_operator: Option<ComparisonOperator>,
    search_mode: Option<SearchMode>,
}

/// Treat `null` and `[]` as the default value
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(T::default()),
        Value::Array(items) if items.is_empty() => Ok(T::default()),
        other => serde_json::from_value(other).map_err(serde::de::Error::custom),
    }
}

impl RawColumn {
    fn into_column(self, key: Option<String>) -> Result<(String, Column), FilterError> {
        let key = key
            .or_else(|| self.name.clone())
            .or_else(|| self.data.clone())
            .ok_or_else(|| FilterError::invalid_descriptor("column without name or data"))?;
        let data = self.data.unwrap_or_else(|| key.clone());
        if data.trim().is_empty() {
            return Err(FilterError::invalid_descriptor(format!(
                "column '{}' has empty data path",
                key
            )));
        }

        Ok((
            key,
            Column {
                data,
                searchable: self.searchable || self.meta.searchable,
            },
        ))
    }
}

/// Decode per-entity sections; `[]` stands for an empty object
fn sections<T: DeserializeOwned>(raw: BTreeMap<String, Value>) -> Result<EntityMap<T>, FilterError> {
    raw.into_iter()
        .map(|(entity, value)| {
            let fields = match value {
                Value::Null => BTreeMap::new(),
                Value::Array(items) if items.is_empty() => BTreeMap::new(),
                other => serde_json::from_value(other).map_err(|e| {
                    FilterError::invalid_descriptor(format!("entity '{}': {}", entity, e))
                })?,
            };
            Ok((entity, fields))
        })
        .collect()
}

impl Descriptor {
    /// Build a descriptor from an already parsed JSON value
    pub fn from_value(value: Value) -> Result<Self, FilterError> {
        let raw: RawDescriptor = match value {
            Value::Null => RawDescriptor::default(),
            other => serde_json::from_value(other)
                .map_err(|e| FilterError::invalid_descriptor(e.to_string()))?,
        };

        let columns = match raw.columns {
            RawColumns::List(list) => list
                .into_iter()
                .map(|column| column.into_column(None))
                .collect::<Result<Vec<_>, _>>()?,
            RawColumns::Keyed(map) => map
                .into_iter()
                .map(|(key, value)| {
                    let column: RawColumn = serde_json::from_value(value).map_err(|e| {
                        FilterError::invalid_descriptor(format!("column '{}': {}", key, e))
                    })?;
                    column.into_column(Some(key))
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(Self {
            columns,
            search: SearchMeta {
                term: raw.meta.search.map(|term| term.to_string()),
                operator: raw.meta.comparison_operator,
                mode: raw.meta.search_mode.unwrap_or_default(),
            },
            filters: sections::<FilterValue>(raw.filters)?,
            intervals: sections::<IntervalSpec>(raw.intervals)?,
        })
    }

    /// Check column and entry counts against the limits
    pub fn check_limits(&self, limits: &DescriptorLimits) -> Result<(), FilterError> {
        if self.columns.len() > limits.max_columns {
            return Err(FilterError::invalid_descriptor(format!(
                "Maximum {} columns allowed",
                limits.max_columns
            )));
        }
        if self.entry_count() > limits.max_entries {
            return Err(FilterError::invalid_descriptor(format!(
                "Maximum {} filter and interval entries allowed",
                limits.max_entries
            )));
        }
        Ok(())
    }
}

/// Parse a descriptor from request JSON
///
/// Validates JSON size, parses the descriptor, and validates counts.
pub fn parse_descriptor(json: &str, limits: &DescriptorLimits) -> Result<Descriptor, FilterError> {
    if json.len() > limits.max_bytes {
        return Err(FilterError::invalid_descriptor(format!(
            "Descriptor JSON exceeds maximum size of {} bytes",
            limits.max_bytes
        )));
    }

    let value: Value =
        serde_json::from_str(json).map_err(|e| FilterError::invalid_descriptor(e.to_string()))?;
    let descriptor = Descriptor::from_value(value)?;
    descriptor.check_limits(limits)?;

    tracing::trace!(
        columns = descriptor.columns.len(),
        entries = descriptor.entry_count(),
        "Parsed descriptor"
    );
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Descriptor, FilterError> {
        parse_descriptor(json, &DescriptorLimits::default())
    }

    #[test]
    fn parse_empty_object() {
        let descriptor = parse("{}").unwrap();
        assert_eq!(descriptor, Descriptor::default());
    }

    #[test]
    fn parse_empty_sections_as_arrays() {
        let descriptor = parse(r#"{"meta": [], "filters": [], "intervals": [], "columns": []}"#).unwrap();
        assert_eq!(descriptor, Descriptor::default());

        let descriptor = parse(r#"{"filters": {"filter_test_models": []}}"#).unwrap();
        assert_eq!(descriptor.filters["filter_test_models"].len(), 0);
    }

    #[test]
    fn parse_keyed_columns_keeps_order() {
        let descriptor = parse(
            r#"{
                "columns": {
                    "name": {"data": "name", "meta": {"searchable": true}},
                    "appellative": {"data": "appellative", "searchable": true},
                    "created_at": {"data": "created_at"}
                }
            }"#,
        )
        .unwrap();

        let keys: Vec<&str> = descriptor.columns.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["name", "appellative", "created_at"]);
        assert!(descriptor.columns[0].1.searchable);
        assert!(descriptor.columns[1].1.searchable);
        assert!(!descriptor.columns[2].1.searchable);
        assert_eq!(descriptor.searchable_columns().count(), 2);
    }

    #[test]
    fn parse_list_columns() {
        let descriptor = parse(
            r#"{"columns": [
                {"name": "relation.name", "data": "relation.name", "meta": {"searchable": true}},
                {"data": "id"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(descriptor.columns[0].0, "relation.name");
        assert_eq!(descriptor.columns[0].1.data, "relation.name");
        assert_eq!(descriptor.columns[1].0, "id");
        assert!(!descriptor.columns[1].1.searchable);
    }

    #[test]
    fn keyed_column_data_defaults_to_key() {
        let descriptor = parse(r#"{"columns": {"name": {"searchable": true}}}"#).unwrap();
        assert_eq!(descriptor.columns[0].1.data, "name");
    }

    #[test]
    fn list_column_without_name_or_data() {
        let err = parse(r#"{"columns": [{"searchable": true}]}"#).unwrap_err();
        assert_eq!(err.code(), "INVALID_DESCRIPTOR");
    }

    #[test]
    fn parse_meta() {
        let descriptor = parse(
            r#"{"meta": {"search": "Harriet", "comparisonOperator": "ILIKE", "searchMode": "startsWith", "length": 10}}"#,
        )
        .unwrap();

        assert_eq!(descriptor.search.term.as_deref(), Some("Harriet"));
        assert_eq!(descriptor.search.operator, Some(ComparisonOperator::ILike));
        assert_eq!(descriptor.search.mode, SearchMode::StartsWith);
    }

    #[test]
    fn numeric_search_term_is_stringified() {
        let descriptor = parse(r#"{"meta": {"search": 42}}"#).unwrap();
        assert_eq!(descriptor.search.term.as_deref(), Some("42"));
        assert_eq!(descriptor.search.operator, None);
    }

    #[test]
    fn parse_filters_and_intervals() {
        let descriptor = parse(
            r#"{
                "filters": {"filter_test_models": {"name": "Harriet Vane", "id": [10, 20]}},
                "intervals": {"filter_test_models": {
                    "id": {"min": 9, "max": 11},
                    "created_at": {"min": "2026-10-17 09:15:00", "max": "2026-10-19 09:15:00", "dbDateFormat": "Y-m-d", "dateFormat": "Y-m-d H:i:s"}
                }}
            }"#,
        )
        .unwrap();

        let filters = &descriptor.filters["filter_test_models"];
        assert_eq!(
            filters["name"],
            FilterValue::Scalar(ScalarValue::Text("Harriet Vane".into()))
        );
        assert!(matches!(filters["id"], FilterValue::List(ref v) if v.len() == 2));

        let intervals = &descriptor.intervals["filter_test_models"];
        assert!(!intervals["id"].is_date());
        assert!(intervals["created_at"].is_date());
        assert_eq!(descriptor.entry_count(), 4);
    }

    #[test]
    fn parse_invalid_json() {
        let err = parse("not valid json").unwrap_err();
        assert!(matches!(err, FilterError::InvalidDescriptor(_)));
    }

    #[test]
    fn parse_rejects_object_filter_value() {
        assert!(parse(r#"{"filters": {"t": {"name": {"nested": 1}}}}"#).is_err());
    }

    #[test]
    fn parse_enforces_limits() {
        let limits = DescriptorLimits {
            max_bytes: 16,
            ..Default::default()
        };
        let err = parse_descriptor(r#"{"columns": {"name": {}}}"#, &limits).unwrap_err();
        assert!(err.to_string().contains("maximum size"));

        let limits = DescriptorLimits {
            max_columns: 1,
            ..Default::default()
        };
        let err = parse_descriptor(r#"{"columns": [{"data": "a"}, {"data": "b"}]}"#, &limits).unwrap_err();
        assert!(err.to_string().contains("Maximum 1 columns"));

        let limits = DescriptorLimits {
            max_entries: 1,
            ..Default::default()
        };
        let err = parse_descriptor(r#"{"filters": {"t": {"a": 1, "b": 2}}}"#, &limits).unwrap_err();
        assert!(err.to_string().contains("entries"));
    }

    #[test]
    fn from_value_null() {
        assert_eq!(Descriptor::from_value(Value::Null).unwrap(), Descriptor::default());
    }
}
