use chrono::NaiveDate;

use crate::api::DaySummary;

/// Flat record of time spent on one file, one day, one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRow {
    pub coding_date: NaiveDate,
    pub editor: String,
    pub project: String,
    pub file_name: String,
    pub file_extension: String,
    /// Textual form of the API number, bound as NUMERIC on insert
    pub total_seconds: String,
}

/// Text after the last '.', or the whole name when there is none
pub fn file_extension(file_name: &str) -> &str {
    file_name.rsplit('.').next().unwrap_or(file_name)
}

/// Flatten one project's day summaries into rows
///
/// Days without an editor are skipped. On days with several editors every
/// file is attributed to the first one.
pub fn build_rows(project: &str, days: &[DaySummary]) -> Vec<ActivityRow> {
    let mut rows = Vec::new();
    for day in days {
        let Some(editor) = day.editors.first() else {
            continue;
        };
        for entity in &day.entities {
            rows.push(ActivityRow {
                coding_date: day.range.date,
                editor: editor.name.clone(),
                project: project.to_string(),
                file_name: entity.name.clone(),
                file_extension: file_extension(&entity.name).to_string(),
                total_seconds: entity.total_seconds.to_string(),
            });
        }
    }
    rows
}
