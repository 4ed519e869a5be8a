//! # End-to-end Tracker Tests
//!
//! Spin up a fake WakaTime (token endpoint + API) with axum, run the whole
//! flow with a scripted code provider, and inspect the SQLite file it wrote.

use axum::{
    extract::{Form, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use track_coding_time::constants::DEFAULT_SUMMARY_RANGE;
use track_coding_time::{run, CodeProvider, FixedCodeProvider, OAuthEndpoints, RunReport, Settings};

const GOOD_CODE: &str = "good-code";
const ACCESS_TOKEN: &str = "test-token";

/// Shared state for test server
#[derive(Default)]
struct MockState {
    token_requests: Mutex<Vec<(HeaderMap, HashMap<String, String>)>>,
    summary_queries: Mutex<Vec<HashMap<String, String>>>,
    /// Project whose summaries request answers 500
    failing_project: Option<String>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {}", ACCESS_TOKEN).as_str())
}

async fn token(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let ok = form.get("code").map(String::as_str) == Some(GOOD_CODE)
        && form.get("grant_type").map(String::as_str) == Some("authorization_code");
    state.token_requests.lock().unwrap().push((headers, form));

    if !ok {
        return (StatusCode::BAD_REQUEST, "error=invalid_grant").into_response();
    }
    (
        [(header::CONTENT_TYPE, "application/x-www-form-urlencoded")],
        format!(
            "access_token={}&refresh_token=refresh-1&token_type=bearer&scope=email%2Cread_stats",
            ACCESS_TOKEN
        ),
    )
        .into_response()
}

async fn current_user(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({"data": {"email": "dev@example.com", "username": "dev", "id": "u-1"}}))
        .into_response()
}

async fn projects(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({"data": [
        {"id": "p-1", "name": "demo"},
        {"id": "p-2", "name": "side project"}
    ]}))
    .into_response()
}

async fn summaries(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let project = params.get("project").cloned().unwrap_or_default();
    state.summary_queries.lock().unwrap().push(params);

    if state.failing_project.as_deref() == Some(project.as_str()) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }

    let data = match project.as_str() {
        "demo" => json!([
            {
                "range": {"date": "2024-01-01", "timezone": "UTC"},
                "editors": [{"name": "VSCode", "total_seconds": 150.5}, {"name": "Vim", "total_seconds": 1}],
                "entities": [
                    {"name": "/home/dev/demo/a.py", "total_seconds": 120.5, "type": "file"},
                    {"name": "/home/dev/demo/o'brien.py", "total_seconds": 30, "type": "file"}
                ]
            },
            {
                "range": {"date": "2024-01-02", "timezone": "UTC"},
                "editors": [],
                "entities": [{"name": "/home/dev/demo/ghost.py", "total_seconds": 5}]
            }
        ]),
        "side project" => json!([
            {
                "range": {"date": "2024-01-03"},
                "editors": [{"name": "Zed"}],
                "entities": [{"name": "/home/dev/side/Makefile", "total_seconds": 60}]
            }
        ]),
        _ => json!([]),
    };
    Json(json!({ "data": data })).into_response()
}

async fn start_test_server(state: Arc<MockState>) -> (String, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/oauth/token", post(token))
        .route("/api/v1/users/current", get(current_user))
        .route("/api/v1/users/current/projects", get(projects))
        .route("/api/v1/users/current/summaries", get(summaries))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("http://{}", addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give server time to start
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    (url, handle)
}

fn endpoints_for(base: &str) -> OAuthEndpoints {
    OAuthEndpoints {
        authorize_url: format!("{}/oauth/authorize", base),
        token_url: format!("{}/oauth/token", base),
        api_base_url: format!("{}/api/v1/", base),
        redirect_uri: format!("{}/oauth/test", base),
    }
}

fn settings_for(db_path: &Path) -> Settings {
    Settings {
        db_uri: format!("sqlite://{}", db_path.display()),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
    }
}

/// Records the authorize URL and answers with a pasted redirect URL
struct RedirectPaster {
    seen_url: Arc<Mutex<Option<String>>>,
    override_state: Option<String>,
}

impl CodeProvider for RedirectPaster {
    fn authorization_code(
        &mut self,
        authorize_url: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        *self.seen_url.lock().unwrap() = Some(authorize_url.to_string());
        let url = url::Url::parse(authorize_url)?;
        let state = match &self.override_state {
            Some(state) => state.clone(),
            None => url
                .query_pairs()
                .find(|(k, _)| k == "state")
                .map(|(_, v)| v.into_owned())
                .ok_or("authorize URL has no state")?,
        };
        Ok(format!(
            "https://wakatime.com/oauth/test?code={}&state={}",
            GOOD_CODE, state
        ))
    }
}

async fn run_blocking<P>(settings: Settings, base: String, provider: P) -> Result<RunReport, String>
where
    P: CodeProvider + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut provider = provider;
        run(
            &settings,
            endpoints_for(&base),
            &mut provider,
            DEFAULT_SUMMARY_RANGE,
        )
        .map_err(|e| e.to_string())
    })
    .await
    .unwrap()
}

async fn stored_rows(db_path: &Path) -> Vec<(String, String, String, String, String, String)> {
    let pool = sqlx::SqlitePool::connect(&format!("sqlite://{}", db_path.display()))
        .await
        .unwrap();
    let rows = sqlx::query_as(
        "SELECT CAST(coding_date AS TEXT), editor, proyecto, archivo, extension, \
         printf('%.2f', tiempo_total) FROM coding_time_track ORDER BY id",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    pool.close().await;
    rows
}

#[tokio::test]
async fn test_full_run_inserts_rows() {
    let state = Arc::new(MockState::default());
    let (base, _handle) = start_test_server(state.clone()).await;
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("stats.db");

    let report = run_blocking(
        settings_for(&db_path),
        base.clone(),
        FixedCodeProvider::new(GOOD_CODE),
    )
    .await
    .unwrap();

    assert_eq!(report.user, "dev@example.com");
    assert_eq!(report.projects, vec!["demo".to_string(), "side project".to_string()]);
    assert_eq!(report.rows_inserted, 3);

    let rows = stored_rows(&db_path).await;
    let expected = [
        ("2024-01-01", "VSCode", "demo", "/home/dev/demo/a.py", "py", "120.50"),
        ("2024-01-01", "VSCode", "demo", "/home/dev/demo/o'brien.py", "py", "30.00"),
        ("2024-01-03", "Zed", "side project", "/home/dev/side/Makefile", "/home/dev/side/Makefile", "60.00"),
    ];
    assert_eq!(rows.len(), expected.len());
    for (row, want) in rows.iter().zip(expected.iter()) {
        assert_eq!(row.0, want.0);
        assert_eq!(row.1, want.1);
        assert_eq!(row.2, want.2);
        assert_eq!(row.3, want.3);
        assert_eq!(row.4, want.4);
        assert_eq!(row.5, want.5);
    }

    // Token exchange sent the expected form
    let token_requests = state.token_requests.lock().unwrap();
    assert_eq!(token_requests.len(), 1);
    let (headers, form) = &token_requests[0];
    assert_eq!(
        headers.get(header::ACCEPT).unwrap(),
        "application/x-www-form-urlencoded"
    );
    assert_eq!(form["client_id"], "client-id");
    assert_eq!(form["client_secret"], "client-secret");
    assert_eq!(form["redirect_uri"], format!("{}/oauth/test", base));
    assert_eq!(form["grant_type"], "authorization_code");

    // One summaries call per project with the default range
    let queries = state.summary_queries.lock().unwrap();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0]["project"], "demo");
    assert_eq!(queries[1]["project"], "side project");
    assert!(queries.iter().all(|q| q["range"] == "last 7 days from yesterday"));
}

#[tokio::test]
async fn test_second_run_duplicates_rows() {
    let state = Arc::new(MockState::default());
    let (base, _handle) = start_test_server(state).await;
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("stats.db");

    run_blocking(settings_for(&db_path), base.clone(), FixedCodeProvider::new(GOOD_CODE))
        .await
        .unwrap();
    assert_eq!(stored_rows(&db_path).await.len(), 3);

    run_blocking(settings_for(&db_path), base, FixedCodeProvider::new(GOOD_CODE))
        .await
        .unwrap();
    assert_eq!(stored_rows(&db_path).await.len(), 6);
}

#[tokio::test]
async fn test_rejected_code_stops_before_database() {
    let state = Arc::new(MockState::default());
    let (base, _handle) = start_test_server(state.clone()).await;
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("stats.db");

    let err = run_blocking(settings_for(&db_path), base, FixedCodeProvider::new("expired"))
        .await
        .unwrap_err();

    assert!(err.contains("HTTP 400"), "{}", err);
    assert_eq!(state.token_requests.lock().unwrap().len(), 1);
    assert!(!db_path.exists());
}

#[tokio::test]
async fn test_pasted_redirect_url_with_matching_state() {
    let state = Arc::new(MockState::default());
    let (base, _handle) = start_test_server(state).await;
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("stats.db");

    let seen_url = Arc::new(Mutex::new(None));
    let provider = RedirectPaster {
        seen_url: seen_url.clone(),
        override_state: None,
    };

    let report = run_blocking(settings_for(&db_path), base.clone(), provider)
        .await
        .unwrap();
    assert_eq!(report.rows_inserted, 3);

    let seen = seen_url.lock().unwrap().clone().unwrap();
    assert!(seen.starts_with(&format!("{}/oauth/authorize?", base)), "{}", seen);
    assert!(seen.contains("response_type=code"), "{}", seen);
    assert!(seen.contains("client_id=client-id"), "{}", seen);
}

#[tokio::test]
async fn test_pasted_redirect_url_with_wrong_state() {
    let state = Arc::new(MockState::default());
    let (base, _handle) = start_test_server(state.clone()).await;
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("stats.db");

    let provider = RedirectPaster {
        seen_url: Arc::new(Mutex::new(None)),
        override_state: Some("forged".to_string()),
    };

    let err = run_blocking(settings_for(&db_path), base, provider)
        .await
        .unwrap_err();

    assert!(err.starts_with("State mismatch (CSRF)"), "{}", err);
    assert!(err.contains("received forged"), "{}", err);
    assert!(state.token_requests.lock().unwrap().is_empty());
    assert!(!db_path.exists());
}

#[tokio::test]
async fn test_failing_summaries_abort_without_rows() {
    let state = Arc::new(MockState {
        failing_project: Some("side project".to_string()),
        ..Default::default()
    });
    let (base, _handle) = start_test_server(state).await;
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("stats.db");

    let err = run_blocking(settings_for(&db_path), base, FixedCodeProvider::new(GOOD_CODE))
        .await
        .unwrap_err();
    assert!(err.contains("HTTP 500"), "{}", err);

    // Table was created before the summaries were fetched, but nothing landed
    assert!(stored_rows(&db_path).await.is_empty());
}
