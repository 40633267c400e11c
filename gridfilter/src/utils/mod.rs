//! Utility functions for the engine

pub mod date_format;
pub mod sql;
