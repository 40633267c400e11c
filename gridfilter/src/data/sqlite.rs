//! SQLite executor
//!
//! Runs a built [`SelectQuery`] against a `SqlitePool`. Queries are only
//! executed here; building and filtering never touch the database.

use std::str::FromStr;

use sqlx::ConnectOptions;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Arguments, Row, SqlitePool};
use tracing::log::LevelFilter;

use super::error::DataError;
use super::predicate::SqlValue;
use super::query::SelectQuery;
use super::sql::Backend;

/// Open a pool for a `sqlite:` URL
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, DataError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(DataError::from_sqlite)?
        .log_statements(LevelFilter::Trace);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(DataError::from_sqlite)?;

    tracing::debug!(%url, max_connections, "SQLite pool opened");
    Ok(pool)
}

/// Fetch every row matched by the query
pub async fn fetch_all(
    pool: &SqlitePool,
    query: &SelectQuery<'_>,
) -> Result<Vec<SqliteRow>, DataError> {
    ensure_backend(query)?;
    let built = query.to_sql();
    tracing::debug!(entity = %query.entity_name(), sql = %built.sql, "Fetching rows");

    sqlx::query_with(&built.sql, bind_values(&built.params)?)
        .fetch_all(pool)
        .await
        .map_err(DataError::from_sqlite)
}

/// Count distinct base rows matched by the query
pub async fn count(pool: &SqlitePool, query: &SelectQuery<'_>) -> Result<u64, DataError> {
    ensure_backend(query)?;
    let built = query.count_sql();
    tracing::debug!(entity = %query.entity_name(), sql = %built.sql, "Counting rows");

    let row = sqlx::query_with(&built.sql, bind_values(&built.params)?)
        .fetch_one(pool)
        .await
        .map_err(DataError::from_sqlite)?;
    let total: i64 = row.try_get(0).map_err(DataError::from_sqlite)?;
    Ok(total.max(0) as u64)
}

fn ensure_backend(query: &SelectQuery<'_>) -> Result<(), DataError> {
    if query.backend() != Backend::Sqlite {
        return Err(DataError::BackendMismatch {
            expected: query.backend().name(),
            actual: Backend::Sqlite.name(),
        });
    }
    Ok(())
}

fn bind_values(values: &[SqlValue]) -> Result<SqliteArguments<'static>, DataError> {
    let mut args = SqliteArguments::default();
    for value in values {
        let bound = match value {
            SqlValue::Null => args.add(Option::<String>::None),
            SqlValue::Text(s) => args.add(s.clone()),
            SqlValue::Integer(i) => args.add(*i),
            SqlValue::Real(r) => args.add(*r),
            SqlValue::Bool(b) => args.add(*b),
        };
        bound.map_err(|e| DataError::from_sqlite(sqlx::Error::Encode(e)))?;
    }
    Ok(args)
}
