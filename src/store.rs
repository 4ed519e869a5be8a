use sqlx::postgres::PgPool;
use sqlx::sqlite::SqlitePool;
use std::future::Future;
use tokio::runtime::Runtime;

use crate::db;
use crate::db_postgres::{self, redact_password};
use crate::rows::ActivityRow;

type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Database flavour selected by the URI scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Postgres,
    Sqlite,
}

/// Pick the backend for a connection URI
///
/// `postgres://`, `postgresql://` and `postgresql+<driver>://` map to
/// PostgreSQL, `sqlite:` to SQLite.
pub fn backend_kind(uri: &str) -> Result<BackendKind, DynError> {
    let scheme = uri.split(':').next().unwrap_or_default();
    let base_scheme = scheme.split('+').next().unwrap_or(scheme);
    match base_scheme {
        "postgres" | "postgresql" => Ok(BackendKind::Postgres),
        "sqlite" => Ok(BackendKind::Sqlite),
        _ => Err(format!(
            "Unsupported database URI scheme '{}' in {}",
            scheme,
            redact_password(uri)
        )
        .into()),
    }
}

enum Pool {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

/// Synchronous database handle that owns a runtime for blocking operations.
///
/// Holds a single connection for the create-table + insert sequence; the
/// connection goes away with the handle.
pub struct SyncStore {
    pool: Pool,
    runtime: Runtime,
}

impl SyncStore {
    /// Connect to the database named by `uri`
    pub fn connect(uri: &str) -> Result<Self, DynError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let pool = match backend_kind(uri)? {
            BackendKind::Postgres => {
                Pool::Postgres(runtime.block_on(db_postgres::open_postgres_connection(uri))?)
            }
            BackendKind::Sqlite => Pool::Sqlite(runtime.block_on(db::open_database_connection(uri))?),
        };

        log::debug!("Connected to {}", redact_password(uri));
        Ok(Self { pool, runtime })
    }

    pub fn kind(&self) -> BackendKind {
        match self.pool {
            Pool::Postgres(_) => BackendKind::Postgres,
            Pool::Sqlite(_) => BackendKind::Sqlite,
        }
    }

    /// Block on an async future using the embedded runtime
    pub fn block_on<F, T>(&self, fut: F) -> Result<T, DynError>
    where
        F: Future<Output = Result<T, DynError>>,
    {
        self.runtime.block_on(fut)
    }

    /// CREATE TABLE IF NOT EXISTS coding_time_track
    pub fn ensure_table(&self) -> Result<(), DynError> {
        match &self.pool {
            Pool::Postgres(pool) => self.block_on(db_postgres::init_database_schema_pg(pool)),
            Pool::Sqlite(pool) => self.block_on(db::init_database_schema(pool)),
        }
    }

    /// Insert every row in a single transaction; an empty slice is a no-op
    pub fn insert_rows(&self, rows: &[ActivityRow]) -> Result<u64, DynError> {
        if rows.is_empty() {
            return Ok(0);
        }
        match &self.pool {
            Pool::Postgres(pool) => self.block_on(db_postgres::insert_activity_rows_pg(pool, rows)),
            Pool::Sqlite(pool) => self.block_on(db::insert_activity_rows(pool, rows)),
        }
    }

    /// Close the connection and wait for it to shut down
    pub fn close(self) {
        match &self.pool {
            Pool::Postgres(pool) => self.runtime.block_on(pool.close()),
            Pool::Sqlite(pool) => self.runtime.block_on(pool.close()),
        }
    }

    /// Underlying SQLite pool, if this store is SQLite-backed
    pub fn sqlite_pool(&self) -> Option<&SqlitePool> {
        match &self.pool {
            Pool::Sqlite(pool) => Some(pool),
            Pool::Postgres(_) => None,
        }
    }

    /// Underlying PostgreSQL pool, if this store is PostgreSQL-backed
    pub fn pg_pool(&self) -> Option<&PgPool> {
        match &self.pool {
            Pool::Postgres(pool) => Some(pool),
            Pool::Sqlite(_) => None,
        }
    }
}
