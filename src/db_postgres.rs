//! PostgreSQL database module
//!
//! Mirrors `db.rs` using PgPool instead of SqlitePool.

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;

use crate::constants::INSERT_CHUNK_ROWS;
use crate::queries::{coding_time, ddl};
use crate::rows::ActivityRow;

type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Turn a SQLAlchemy-style URI into one sqlx understands
///
/// `postgresql+psycopg2://user:pw@host/db` becomes `postgresql://user:pw@host/db`.
/// Everything after the scheme is left untouched.
pub fn normalize_postgres_url(uri: &str) -> Result<String, DynError> {
    let (scheme, rest) = uri
        .split_once("://")
        .ok_or_else(|| format!("Invalid database URI (missing scheme): {}", redact_password(uri)))?;

    let base_scheme = scheme.split('+').next().unwrap_or(scheme);
    match base_scheme {
        "postgres" | "postgresql" => Ok(format!("{}://{}", base_scheme, rest)),
        other => Err(format!("Not a PostgreSQL URI scheme: {}", other).into()),
    }
}

/// Hide the password of a URI for log and error messages
pub fn redact_password(uri: &str) -> String {
    match url::Url::parse(uri) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        Ok(url) => url.to_string(),
        Err(_) => "<unparsable uri>".to_string(),
    }
}

/// Open a single-connection PostgreSQL pool
pub async fn open_postgres_connection(uri: &str) -> Result<PgPool, DynError> {
    let full_url = normalize_postgres_url(uri)?;

    let options = PgConnectOptions::from_str(&full_url)?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create the coding_time_track table if it does not exist (PostgreSQL version)
pub async fn init_database_schema_pg(pool: &PgPool) -> Result<(), DynError> {
    sqlx::query(&ddl::create_coding_time_track_table_pg())
        .execute(pool)
        .await?;
    Ok(())
}

/// Insert all rows in one transaction (PostgreSQL version)
pub async fn insert_activity_rows_pg(pool: &PgPool, rows: &[ActivityRow]) -> Result<u64, DynError> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
        let mut builder = coding_time::insert_rows_pg(chunk);
        match builder.build().execute(&mut *tx).await {
            Ok(result) => inserted += result.rows_affected(),
            Err(e) => {
                tx.rollback().await?;
                return Err(e.into());
            }
        }
    }

    tx.commit().await?;
    Ok(inserted)
}
