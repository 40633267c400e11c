//! Data layer
//!
//! - `schema` - Declared entities, fields and relations
//! - `predicate` - Predicate fragments and bound values
//! - `query` - Per-request SELECT builder with relation registry
//! - `sql` - SQL dialects for SQLite and PostgreSQL
//! - `sqlite` / `postgres` - Executors over sqlx pools
//! - `error` - Unified error type for the data layer

pub mod error;
pub mod postgres;
pub mod predicate;
pub mod query;
pub mod schema;
pub mod sql;
pub mod sqlite;

pub use error::DataError;
pub use predicate::{ColumnExpr, ColumnRef, Predicate, SqlParams, SqlValue};
pub use query::{BuiltQuery, Checkpoint, Join, OrderDirection, RelationRegistry, SelectQuery};
pub use schema::{EntityDef, FieldKind, RelationDef, RelationKind, Schema};
pub use sql::{Backend, SqlDialect};

use crate::core::config::DatabaseConfig;

/// Connection pool for the configured backend
pub enum DatabaseService {
    Sqlite(sqlx::SqlitePool),
    Postgres(sqlx::PgPool),
}

impl DatabaseService {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DataError> {
        match config.backend {
            Backend::Sqlite => Ok(Self::Sqlite(
                sqlite::connect(&config.url, config.max_connections).await?,
            )),
            Backend::Postgres => Ok(Self::Postgres(
                postgres::connect(&config.url, config.max_connections).await?,
            )),
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            Self::Sqlite(_) => Backend::Sqlite,
            Self::Postgres(_) => Backend::Postgres,
        }
    }

    /// Number of rows a fetch of this query returns
    pub async fn fetch_len(&self, query: &SelectQuery<'_>) -> Result<usize, DataError> {
        match self {
            Self::Sqlite(pool) => Ok(sqlite::fetch_all(pool, query).await?.len()),
            Self::Postgres(pool) => Ok(postgres::fetch_all(pool, query).await?.len()),
        }
    }

    pub async fn count(&self, query: &SelectQuery<'_>) -> Result<u64, DataError> {
        match self {
            Self::Sqlite(pool) => sqlite::count(pool, query).await,
            Self::Postgres(pool) => postgres::count(pool, query).await,
        }
    }

    pub async fn close(&self) {
        match self {
            Self::Sqlite(pool) => pool.close().await,
            Self::Postgres(pool) => pool.close().await,
        }
    }
}
