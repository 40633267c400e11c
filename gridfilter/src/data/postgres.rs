//! PostgreSQL executor

use std::time::Duration;

use sqlx::ConnectOptions;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{Arguments, PgPool, Row};
use tracing::log::LevelFilter;

use super::error::DataError;
use super::predicate::SqlValue;
use super::query::SelectQuery;
use super::sql::Backend;

const ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Open a pool for a `postgres://` URL
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, DataError> {
    let options: PgConnectOptions = url.parse().map_err(DataError::from_postgres)?;
    let options = options.log_statements(LevelFilter::Trace);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
        .connect_with(options)
        .await
        .map_err(DataError::from_postgres)?;

    tracing::debug!(max_connections, "PostgreSQL pool opened");
    Ok(pool)
}

pub async fn fetch_all(pool: &PgPool, query: &SelectQuery<'_>) -> Result<Vec<PgRow>, DataError> {
    ensure_backend(query)?;
    let built = query.to_sql();
    tracing::debug!(entity = %query.entity_name(), sql = %built.sql, "Fetching rows");

    sqlx::query_with(&built.sql, bind_values(&built.params)?)
        .fetch_all(pool)
        .await
        .map_err(DataError::from_postgres)
}

pub async fn count(pool: &PgPool, query: &SelectQuery<'_>) -> Result<u64, DataError> {
    ensure_backend(query)?;
    let built = query.count_sql();
    tracing::debug!(entity = %query.entity_name(), sql = %built.sql, "Counting rows");

    let row = sqlx::query_with(&built.sql, bind_values(&built.params)?)
        .fetch_one(pool)
        .await
        .map_err(DataError::from_postgres)?;
    let total: i64 = row.try_get(0).map_err(DataError::from_postgres)?;
    Ok(total.max(0) as u64)
}

fn ensure_backend(query: &SelectQuery<'_>) -> Result<(), DataError> {
    if query.backend() != Backend::Postgres {
        return Err(DataError::BackendMismatch {
            expected: query.backend().name(),
            actual: Backend::Postgres.name(),
        });
    }
    Ok(())
}

fn bind_values(values: &[SqlValue]) -> Result<PgArguments, DataError> {
    let mut args = PgArguments::default();
    for value in values {
        let bound = match value {
            SqlValue::Null => args.add(Option::<String>::None),
            SqlValue::Text(s) => args.add(s.clone()),
            SqlValue::Integer(i) => args.add(*i),
            SqlValue::Real(r) => args.add(*r),
            SqlValue::Bool(b) => args.add(*b),
        };
        bound.map_err(|e| DataError::from_postgres(sqlx::Error::Encode(e)))?;
    }
    Ok(args)
}
