use crate::api;
use crate::config::Settings;
use crate::db_postgres::redact_password;
use crate::oauth::{CodeProvider, OAuthEndpoints, WakaTimeService};
use crate::rows::{build_rows, ActivityRow};
use crate::session::AuthorizedSession;
use crate::store::SyncStore;

type DynError = Box<dyn std::error::Error + Send + Sync>;

/// What a completed run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Email (or username) of the authorized account
    pub user: String,
    /// Projects whose summaries were fetched
    pub projects: Vec<String>,
    /// Rows written to coding_time_track
    pub rows_inserted: u64,
}

/// Authorize, fetch the summaries and store them
///
/// Every run inserts the whole window again; nothing is deduplicated.
pub fn run(
    settings: &Settings,
    endpoints: OAuthEndpoints,
    provider: &mut dyn CodeProvider,
    range: &str,
) -> Result<RunReport, DynError> {
    let service = WakaTimeService::new(&settings.client_id, &settings.client_secret, endpoints)?;
    let session = service.authorize(provider)?;
    get_and_upload_data(&settings.db_uri, &session, range)
}

/// Fetch user, projects and per-project summaries, then write the rows
///
/// The database connection is opened only once the project list is known and
/// is closed before returning, on success or failure.
pub fn get_and_upload_data(
    db_uri: &str,
    session: &AuthorizedSession,
    range: &str,
) -> Result<RunReport, DynError> {
    log::info!("Getting current user from API...");
    let user = api::current_user(session)?;
    log::info!("Authenticated via OAuth as {}", user.display_name());

    log::info!("Getting user's coding stats from API...");
    let projects = api::project_names(session)?;
    log::debug!("Found {} projects", projects.len());

    log::info!("Connecting to {}", redact_password(db_uri));
    let store = SyncStore::connect(db_uri)?;
    let result = create_and_insert(&store, session, &projects, range);
    store.close();
    let rows_inserted = result?;

    log::info!("Data uploaded successfully! ({} rows)", rows_inserted);
    Ok(RunReport {
        user: user.display_name().to_string(),
        projects,
        rows_inserted,
    })
}

fn create_and_insert(
    store: &SyncStore,
    session: &AuthorizedSession,
    projects: &[String],
    range: &str,
) -> Result<u64, DynError> {
    log::info!("Creating table if not exists...");
    store.ensure_table()?;

    let rows = collect_rows(session, projects, range)?;
    store.insert_rows(&rows)
}

/// One summaries call per project, rows concatenated in project order
pub fn collect_rows(
    session: &AuthorizedSession,
    projects: &[String],
    range: &str,
) -> Result<Vec<ActivityRow>, DynError> {
    let mut rows = Vec::new();
    for project in projects {
        log::info!("Getting summaries for project {}...", project);
        let days = api::project_summaries(session, project, range)?;
        let project_rows = build_rows(project, &days);
        log::debug!(
            "[{}] {} days, {} rows",
            project,
            days.len(),
            project_rows.len()
        );
        rows.extend(project_rows);
    }
    Ok(rows)
}
