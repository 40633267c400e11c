//! Dynamic filter construction for data grids
//!
//! A grid request [`filters::Descriptor`] (searchable columns, free-text
//! search, explicit filters and value intervals) is compiled by
//! [`filters::PredicateCompiler`] into predicates on a per-request
//! [`data::SelectQuery`], which renders SQL for SQLite or PostgreSQL and
//! runs through sqlx.

mod app;
pub mod core;
pub mod data;
pub mod filters;
pub mod template;
pub mod utils;
