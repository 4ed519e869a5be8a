use sea_query::{ColumnDef, PostgresQueryBuilder, SqliteQueryBuilder, Table, TableCreateStatement};

use crate::schema::CodingTimeTrack;

/// Column definitions shared by both backends; only the id type differs
fn coding_time_track_table(id: ColumnDef) -> TableCreateStatement {
    Table::create()
        .table(CodingTimeTrack::Table)
        .if_not_exists()
        .col(id)
        .col(ColumnDef::new(CodingTimeTrack::CodingDate).date().not_null())
        .col(
            ColumnDef::new(CodingTimeTrack::Editor)
                .string_len(100)
                .not_null(),
        )
        .col(
            ColumnDef::new(CodingTimeTrack::Proyecto)
                .string_len(100)
                .not_null(),
        )
        .col(
            ColumnDef::new(CodingTimeTrack::Archivo)
                .string_len(250)
                .not_null(),
        )
        .col(
            ColumnDef::new(CodingTimeTrack::Extension)
                .string_len(50)
                .not_null(),
        )
        .col(
            ColumnDef::new(CodingTimeTrack::TiempoTotal)
                .decimal_len(10, 2)
                .not_null(),
        )
        .to_owned()
}

/// CREATE TABLE IF NOT EXISTS coding_time_track (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     coding_date DATE NOT NULL,
///     editor VARCHAR(100) NOT NULL,
///     proyecto VARCHAR(100) NOT NULL,
///     archivo VARCHAR(250) NOT NULL,
///     extension VARCHAR(50) NOT NULL,
///     tiempo_total DECIMAL(10, 2) NOT NULL
/// )
pub fn create_coding_time_track_table() -> String {
    coding_time_track_table(
        ColumnDef::new(CodingTimeTrack::Id)
            .integer()
            .not_null()
            .primary_key()
            .auto_increment()
            .to_owned(),
    )
    .to_string(SqliteQueryBuilder)
}

// ============================================================================
// PostgreSQL variants
// ============================================================================

/// CREATE TABLE IF NOT EXISTS coding_time_track - PostgreSQL
/// Note: id becomes SERIAL
pub fn create_coding_time_track_table_pg() -> String {
    coding_time_track_table(
        ColumnDef::new(CodingTimeTrack::Id)
            .integer()
            .not_null()
            .primary_key()
            .auto_increment()
            .to_owned(),
    )
    .to_string(PostgresQueryBuilder)
}
