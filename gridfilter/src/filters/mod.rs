//! Grid filter engine
//!
//! Turns a request [`Descriptor`] into predicates on a [`SelectQuery`]:
//! - `descriptor` / `parser` - Request model and JSON parsing with limits
//! - `resolver` - Dotted column paths to aliases, registering joins
//! - `coercer` - Value normalization per field kind and date format
//! - `compiler` - Stage-ordered predicate composition
//!
//! [`SelectQuery`]: crate::data::SelectQuery

mod coercer;
mod compiler;
mod config;
mod descriptor;
mod error;
mod parser;
mod resolver;


pub use coercer::{CoercedInterval, coerce_interval, coerce_scalar};
pub use compiler::PredicateCompiler;
pub use config::{DescriptorLimits, FilterConfig, InvertedIntervalPolicy};
pub use descriptor::{
    Column, ComparisonOperator, Descriptor, EntityMap, FilterValue, IntervalSpec, ScalarValue,
    SearchMeta, SearchMode,
};
pub use error::FilterError;
pub use parser::parse_descriptor;
pub use resolver::{ColumnResolver, ResolvedColumn};
