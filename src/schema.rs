use sea_query::Iden;

/// coding_time_track table - one row per (day, project, file)
#[derive(Iden)]
pub enum CodingTimeTrack {
    Table,
    Id,
    CodingDate,
    Editor,
    Proyecto,
    Archivo,
    Extension,
    TiempoTotal,
}
