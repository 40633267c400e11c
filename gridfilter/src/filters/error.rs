//! Filter compilation errors

use thiserror::Error;

/// Errors raised while parsing a descriptor or compiling it onto a query.
///
/// All of them are configuration errors: they are not retried and the query
/// they were compiled against is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// A relation or field segment does not exist on the traversed entity
    #[error("Cannot resolve column '{path}': '{segment}' is not defined on {entity}")]
    UnresolvableColumn {
        path: String,
        entity: String,
        segment: String,
    },

    /// An interval bound is malformed or the bounds are inverted
    #[error("Invalid interval for {entity}.{field}: {reason}")]
    InvalidIntervalValue {
        entity: String,
        field: String,
        reason: String,
    },

    /// An explicit filter value does not fit the field kind
    #[error("Invalid filter value for {entity}.{field}: {reason}")]
    InvalidFilterValue {
        entity: String,
        field: String,
        reason: String,
    },

    /// The request descriptor is malformed or exceeds a limit
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),
}

impl FilterError {
    pub fn unresolvable(
        path: impl Into<String>,
        entity: impl Into<String>,
        segment: impl Into<String>,
    ) -> Self {
        Self::UnresolvableColumn {
            path: path.into(),
            entity: entity.into(),
            segment: segment.into(),
        }
    }

    pub fn invalid_interval(entity: &str, field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidIntervalValue {
            entity: entity.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_filter(entity: &str, field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFilterValue {
            entity: entity.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_descriptor(reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor(reason.into())
    }

    /// Stable error code for the request layer
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnresolvableColumn { .. } => "UNRESOLVABLE_COLUMN",
            Self::InvalidIntervalValue { .. } => "INVALID_INTERVAL_VALUE",
            Self::InvalidFilterValue { .. } => "INVALID_FILTER_VALUE",
            Self::InvalidDescriptor(_) => "INVALID_DESCRIPTOR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            FilterError::unresolvable("relation.nope", "filter_relation_models", "nope").code(),
            "UNRESOLVABLE_COLUMN"
        );
        assert_eq!(
            FilterError::invalid_interval("t", "id", "min > max").code(),
            "INVALID_INTERVAL_VALUE"
        );
        assert_eq!(
            FilterError::invalid_filter("t", "id", "not an integer").code(),
            "INVALID_FILTER_VALUE"
        );
        assert_eq!(
            FilterError::invalid_descriptor("too large").code(),
            "INVALID_DESCRIPTOR"
        );
    }

    #[test]
    fn test_display() {
        let err = FilterError::unresolvable("relation.nope", "filter_relation_models", "nope");
        assert_eq!(
            err.to_string(),
            "Cannot resolve column 'relation.nope': 'nope' is not defined on filter_relation_models"
        );
    }
}
