//! WakaTime API calls made through an authorized session
//!
//! Every response is wrapped in a `{"data": ...}` envelope. Only the fields
//! the tracker needs are modelled; anything else in the payload is ignored.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::session::AuthorizedSession;

type DynError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl CurrentUser {
    /// Best identifier to show the operator
    pub fn display_name(&self) -> &str {
        self.email
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("unknown user")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryRange {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Editor {
    pub name: String,
}

/// Per-file time total; `total_seconds` keeps the JSON number as sent
#[derive(Debug, Clone, Deserialize)]
pub struct Entity {
    pub name: String,
    pub total_seconds: serde_json::Number,
}

/// One day of activity for a project
#[derive(Debug, Clone, Deserialize)]
pub struct DaySummary {
    pub range: SummaryRange,
    #[serde(default)]
    pub editors: Vec<Editor>,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

/// GET users/current
pub fn current_user(session: &AuthorizedSession) -> Result<CurrentUser, DynError> {
    let envelope: Envelope<CurrentUser> = session.get_json("users/current", &[])?;
    Ok(envelope.data)
}

/// GET users/current/projects, names in response order
pub fn project_names(session: &AuthorizedSession) -> Result<Vec<String>, DynError> {
    let envelope: Envelope<Vec<Project>> = session.get_json("users/current/projects", &[])?;
    Ok(envelope.data.into_iter().map(|p| p.name).collect())
}

/// GET users/current/summaries for one project
pub fn project_summaries(
    session: &AuthorizedSession,
    project: &str,
    range: &str,
) -> Result<Vec<DaySummary>, DynError> {
    let envelope: Envelope<Vec<DaySummary>> = session.get_json(
        "users/current/summaries",
        &[("project", project), ("range", range)],
    )?;
    Ok(envelope.data)
}
