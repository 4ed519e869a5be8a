use sea_query::Iden;
use sqlx::{Postgres, QueryBuilder, Sqlite};

use crate::rows::ActivityRow;
use crate::schema::CodingTimeTrack;

/// INSERT INTO coding_time_track (coding_date, editor, ..., tiempo_total)
fn insert_prefix() -> String {
    let columns = [
        CodingTimeTrack::CodingDate,
        CodingTimeTrack::Editor,
        CodingTimeTrack::Proyecto,
        CodingTimeTrack::Archivo,
        CodingTimeTrack::Extension,
        CodingTimeTrack::TiempoTotal,
    ]
    .iter()
    .map(|c| c.to_string())
    .collect::<Vec<_>>()
    .join(", ");

    format!(
        "INSERT INTO {} ({}) ",
        CodingTimeTrack::Table.to_string(),
        columns
    )
}

/// Multi-row INSERT with every value bound as a parameter
///
/// INSERT INTO coding_time_track (...) VALUES (?, ?, ?, ?, ?, CAST(? AS NUMERIC)), ...
pub fn insert_rows(rows: &[ActivityRow]) -> QueryBuilder<'_, Sqlite> {
    let mut builder = QueryBuilder::new(insert_prefix());
    builder.push_values(rows, |mut b, row| {
        b.push_bind(row.coding_date)
            .push_bind(row.editor.as_str())
            .push_bind(row.project.as_str())
            .push_bind(row.file_name.as_str())
            .push_bind(row.file_extension.as_str())
            .push("CAST(")
            .push_bind_unseparated(row.total_seconds.as_str())
            .push_unseparated(" AS NUMERIC)");
    });
    builder
}

// ============================================================================
// PostgreSQL variants
// ============================================================================

/// Multi-row INSERT with every value bound as a parameter - PostgreSQL
///
/// INSERT INTO coding_time_track (...) VALUES ($1, $2, $3, $4, $5, CAST($6 AS NUMERIC)), ...
pub fn insert_rows_pg(rows: &[ActivityRow]) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(insert_prefix());
    builder.push_values(rows, |mut b, row| {
        b.push_bind(row.coding_date)
            .push_bind(row.editor.as_str())
            .push_bind(row.project.as_str())
            .push_bind(row.file_name.as_str())
            .push_bind(row.file_extension.as_str())
            .push("CAST(")
            .push_bind_unseparated(row.total_seconds.as_str())
            .push_unseparated(" AS NUMERIC)");
    });
    builder
}
