//! Unified error type for data layer
//!
//! Covers schema validation, query construction and execution errors from
//! both supported backends (SQLite, PostgreSQL).

use thiserror::Error;

/// Unified error type for data layer operations
#[derive(Error, Debug)]
pub enum DataError {
    /// SQLite database error
    #[error("SQLite error: {0}")]
    Sqlite(sqlx::Error),

    /// PostgreSQL database error
    #[error("PostgreSQL error: {0}")]
    Postgres(sqlx::Error),

    /// Schema declaration is inconsistent
    #[error("Invalid schema for {entity}: {reason}")]
    InvalidSchema { entity: String, reason: String },

    /// Entity is not declared in the schema
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// Relation is not declared on the entity
    #[error("Entity {entity} has no relation named '{relation}'")]
    UnknownRelation { entity: String, relation: String },

    /// Query was built for another backend than the pool it runs on
    #[error("Query built for {expected} cannot run on {actual}")]
    BackendMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

impl DataError {
    /// Create a SQLite error with preserved context
    pub fn from_sqlite(e: sqlx::Error) -> Self {
        Self::Sqlite(e)
    }

    /// Create a PostgreSQL error with preserved context
    pub fn from_postgres(e: sqlx::Error) -> Self {
        Self::Postgres(e)
    }

    /// Create an invalid schema error
    pub fn invalid_schema(entity: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            entity: entity.to_string(),
            reason: reason.into(),
        }
    }


    /// Get the backend name that generated this error
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Postgres(_) => "postgres",
            Self::BackendMismatch { actual, .. } => *actual,
            Self::InvalidSchema { .. } | Self::UnknownEntity(_) | Self::UnknownRelation { .. } => {
                "unknown"
            }
        }
    }
}
