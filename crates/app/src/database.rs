//! Database connection management

use sqlx::{
    PgPool, Row,
    error::{BoxDynError, DatabaseError, ErrorKind},
    migrate::MigrateError,
    postgres::PgRow,
};
use stockgate::repository::StoreError;
use thiserror::Error;

/// A stored text value that does not name a known variant.
#[derive(Debug, Error)]
#[error("unrecognised {column} value: {value:?}")]
pub(crate) struct UnknownValue {
    column: &'static str,
    value: String,
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}

/// Apply pending schema migrations.
///
/// # Errors
///
/// Returns an error when a migration fails to apply.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// Map a driver error onto the repository error the workflow understands.
///
/// Constraint violations that carry domain meaning are handled by the caller
/// before falling back to this.
pub(crate) fn store_error(error: sqlx::Error) -> StoreError {
    if matches!(error, sqlx::Error::RowNotFound) {
        return StoreError::NotFound;
    }

    StoreError::Unavailable(error.to_string())
}

pub(crate) fn violation_kind(error: &sqlx::Error) -> Option<ErrorKind> {
    error.as_database_error().map(DatabaseError::kind)
}

pub(crate) fn column_error(column: &str, source: impl Into<BoxDynError>) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: source.into(),
    }
}

/// Widen an unsigned amount for a `BIGINT` bind.
pub(crate) fn to_i64(value: u64, column: &str) -> Result<i64, sqlx::Error> {
    i64::try_from(value).map_err(|e| column_error(column, e))
}

pub(crate) fn opt_to_i64(value: Option<u64>, column: &str) -> Result<Option<i64>, sqlx::Error> {
    value.map(|value| to_i64(value, column)).transpose()
}

pub(crate) fn get_u64(row: &PgRow, column: &str) -> sqlx::Result<u64> {
    let value: i64 = row.try_get(column)?;

    u64::try_from(value).map_err(|e| column_error(column, e))
}

pub(crate) fn get_opt_u64(row: &PgRow, column: &str) -> sqlx::Result<Option<u64>> {
    let value: Option<i64> = row.try_get(column)?;

    value
        .map(|value| u64::try_from(value).map_err(|e| column_error(column, e)))
        .transpose()
}

/// Decode a text column through a variant parser.
pub(crate) fn get_parsed<T>(
    row: &PgRow,
    column: &'static str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> sqlx::Result<T> {
    let value: String = row.try_get(column)?;

    parse(&value).ok_or_else(|| column_error(column, UnknownValue { column, value }))
}
