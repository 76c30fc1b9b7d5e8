//! # Database Persistence Layer
//!
//! Postgres persistence for the registry via SQLx.
//!
//! ## Architecture
//!
//! The database layer is **optional**. When `DATABASE_URL` is set, handlers
//! write through to PostgreSQL after committing to the in-memory stores,
//! and the stores are hydrated from the database on startup. When absent,
//! the API runs in-memory only (development and tests).
//!
//! Enumerations are stored as their wire literals in TEXT columns. A row
//! whose literal no longer parses is logged and skipped on load rather
//! than failing startup.

pub mod credentials;
pub mod institutions;
pub mod pathways;
pub mod recognitions;

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::state::AppConfig;

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if no database URL is configured (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(config: &AppConfig) -> Result<Option<PgPool>, sqlx::Error> {
    let url = match &config.database_url {
        Some(url) => url,
        None => {
            tracing::warn!(
                "DATABASE_URL not set; running in-memory only. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Connected to PostgreSQL"
    );

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Parse a stored enumeration literal, logging the offending row on failure.
pub(crate) fn parse_column<T>(table: &str, column: &str, id: uuid::Uuid, raw: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(table, column, %id, error = %e, "unparseable value in database row");
            None
        }
    }
}

/// Like [`parse_column`] for nullable columns. `Err(())` means the row is unusable.
pub(crate) fn parse_optional_column<T>(
    table: &str,
    column: &str,
    id: uuid::Uuid,
    raw: Option<&str>,
) -> Result<Option<T>, ()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(None),
        Some(raw) => parse_column(table, column, id, raw).map(Some).ok_or(()),
    }
}
