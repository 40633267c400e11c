//! Value coercion
//!
//! Normalizes request values to the comparison semantics of the target
//! field before they are bound: numeric strings become numbers for numeric
//! columns, and date bounds are parsed under their presentation format and
//! re-rendered under the storage format.

use std::cmp::Ordering;

use super::config::InvertedIntervalPolicy;
use super::descriptor::{IntervalSpec, ScalarValue};
use super::error::FilterError;
use crate::data::{FieldKind, SqlValue};
use crate::utils::date_format::DateFormat;

/// Interval bounds ready to bind
#[derive(Debug, Clone, PartialEq)]
pub struct CoercedInterval {
    pub min: SqlValue,
    pub max: SqlValue,
    /// Format the column is rendered through for date intervals: the
    /// storage granularity in year-to-second order
    pub storage_format: Option<DateFormat>,
}

/// Coerce one scalar to the comparison type of a field kind
pub fn coerce_scalar(kind: FieldKind, value: &ScalarValue) -> Result<SqlValue, String> {
    match kind {
        FieldKind::Integer => match value {
            ScalarValue::Integer(i) => Ok(SqlValue::Integer(*i)),
            ScalarValue::Real(r) => Ok(SqlValue::Real(*r)),
            ScalarValue::Text(s) => parse_number(s),
            ScalarValue::Bool(b) => Err(format!("'{}' is not a number", b)),
        },
        FieldKind::Real => match value {
            ScalarValue::Integer(i) => Ok(SqlValue::Real(*i as f64)),
            ScalarValue::Real(r) => Ok(SqlValue::Real(*r)),
            ScalarValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(SqlValue::Real)
                .map_err(|_| format!("'{}' is not a number", s)),
            ScalarValue::Bool(b) => Err(format!("'{}' is not a number", b)),
        },
        FieldKind::Boolean => match value {
            ScalarValue::Bool(b) => Ok(SqlValue::Bool(*b)),
            ScalarValue::Integer(0) => Ok(SqlValue::Bool(false)),
            ScalarValue::Integer(1) => Ok(SqlValue::Bool(true)),
            ScalarValue::Text(s) => match s.trim() {
                "true" | "1" => Ok(SqlValue::Bool(true)),
                "false" | "0" => Ok(SqlValue::Bool(false)),
                other => Err(format!("'{}' is not a boolean", other)),
            },
            other => Err(format!("'{}' is not a boolean", other)),
        },
        FieldKind::Text | FieldKind::Date | FieldKind::Datetime => match value {
            ScalarValue::Text(s) => Ok(SqlValue::Text(s.clone())),
            other => Ok(SqlValue::Text(other.to_string())),
        },
    }
}

fn parse_number(s: &str) -> Result<SqlValue, String> {
    let trimmed = s.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(SqlValue::Integer(i));
    }
    trimmed
        .parse::<f64>()
        .map(SqlValue::Real)
        .map_err(|_| format!("'{}' is not a number", s))
}

fn compare(a: &SqlValue, b: &SqlValue) -> Option<Ordering> {
    match (a, b) {
        (SqlValue::Integer(x), SqlValue::Integer(y)) => Some(x.cmp(y)),
        (SqlValue::Integer(x), SqlValue::Real(y)) => (*x as f64).partial_cmp(y),
        (SqlValue::Real(x), SqlValue::Integer(y)) => x.partial_cmp(&(*y as f64)),
        (SqlValue::Real(x), SqlValue::Real(y)) => x.partial_cmp(y),
        (SqlValue::Text(x), SqlValue::Text(y)) => Some(x.cmp(y)),
        (SqlValue::Bool(x), SqlValue::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn check_order(
    entity: &str,
    field: &str,
    ordering: Option<Ordering>,
    policy: InvertedIntervalPolicy,
) -> Result<(), FilterError> {
    if ordering == Some(Ordering::Greater) && policy == InvertedIntervalPolicy::Reject {
        return Err(FilterError::invalid_interval(
            entity,
            field,
            "min is greater than max",
        ));
    }
    Ok(())
}

/// Coerce an interval entry.
///
/// Returns `None` when a bound is missing, since a half-open interval
/// contributes no fragment.
pub fn coerce_interval(
    entity: &str,
    field: &str,
    spec: &IntervalSpec,
    kind: FieldKind,
    policy: InvertedIntervalPolicy,
) -> Result<Option<CoercedInterval>, FilterError> {
    let Some((min, max)) = spec.bounds() else {
        return Ok(None);
    };

    if let Some((presentation, storage)) = spec.date_formats() {
        let invalid = |e: &dyn std::fmt::Display| FilterError::invalid_interval(entity, field, e.to_string());
        let presentation = DateFormat::parse(presentation).map_err(|e| invalid(&e))?;
        let storage = DateFormat::parse(storage).map_err(|e| invalid(&e))?;
        let sortable = storage.sortable().ok_or_else(|| {
            FilterError::invalid_interval(
                entity,
                field,
                format!("date format '{}' has no date or time field", storage),
            )
        })?;

        let min_at = presentation
            .parse_value(&min.to_string())
            .map_err(|e| invalid(&e))?;
        let max_at = presentation
            .parse_value(&max.to_string())
            .map_err(|e| invalid(&e))?;
        // compared as text in SQL, so compare the rendered keys here too
        let min_key = sortable.format(&min_at);
        let max_key = sortable.format(&max_at);
        check_order(entity, field, Some(min_key.cmp(&max_key)), policy)?;

        return Ok(Some(CoercedInterval {
            min: SqlValue::Text(min_key),
            max: SqlValue::Text(max_key),
            storage_format: Some(sortable),
        }));
    }

    let min = coerce_scalar(kind, min).map_err(|e| FilterError::invalid_interval(entity, field, e))?;
    let max = coerce_scalar(kind, max).map_err(|e| FilterError::invalid_interval(entity, field, e))?;
    check_order(entity, field, compare(&min, &max), policy)?;

    Ok(Some(CoercedInterval {
        min,
        max,
        storage_format: None,
    }))
}
