//! Filter engine settings

use serde::{Deserialize, Serialize};

use super::descriptor::ComparisonOperator;
use crate::core::constants::{
    DEFAULT_MAX_COLUMNS, DEFAULT_MAX_DESCRIPTOR_BYTES, DEFAULT_MAX_ENTRIES,
};

/// What to do with an interval whose `min` is greater than its `max`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvertedIntervalPolicy {
    /// Fail with `InvalidIntervalValue`
    #[default]
    Reject,
    /// Emit the range unchanged; it matches nothing
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorLimits {
    pub max_bytes: usize,
    pub max_columns: usize,
    /// Filter and interval entries, summed over all entities
    pub max_entries: usize,
}

impl Default for DescriptorLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_DESCRIPTOR_BYTES,
            max_columns: DEFAULT_MAX_COLUMNS,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    /// Split the search term on whitespace; every token must match a column
    pub tokenize_search: bool,
    /// Operator used when the request names none
    pub default_operator: ComparisonOperator,
    pub inverted_intervals: InvertedIntervalPolicy,
    pub limits: DescriptorLimits,
}
