//! SQLite database module
//!
//! Same operations as `db_postgres`, for `sqlite:` URIs. Handy for local
//! runs without a PostgreSQL server.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::constants::INSERT_CHUNK_ROWS;
use crate::queries::{coding_time, ddl};
use crate::rows::ActivityRow;

type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Open a single-connection SQLite pool, creating the file if needed
pub async fn open_database_connection(url: &str) -> Result<SqlitePool, DynError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create the coding_time_track table if it does not exist
pub async fn init_database_schema(pool: &SqlitePool) -> Result<(), DynError> {
    sqlx::query(&ddl::create_coding_time_track_table())
        .execute(pool)
        .await?;
    Ok(())
}

/// Insert all rows in one transaction
///
/// Returns the number of rows inserted. Any failure rolls back every row.
pub async fn insert_activity_rows(pool: &SqlitePool, rows: &[ActivityRow]) -> Result<u64, DynError> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
        let mut builder = coding_time::insert_rows(chunk);
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
