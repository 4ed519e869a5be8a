/// WakaTime OAuth authorization page
pub const AUTHORIZE_URL: &str = "https://wakatime.com/oauth/authorize";

/// WakaTime OAuth token endpoint
pub const TOKEN_URL: &str = "https://wakatime.com/oauth/token";

/// Base URL for all API calls made through an authorized session
pub const API_BASE_URL: &str = "https://wakatime.com/api/v1/";

/// Out-of-band redirect page that displays the code for copy/paste
pub const REDIRECT_URI: &str = "https://wakatime.com/oauth/test";

/// Scopes requested during authorization (comma separated, as WakaTime expects)
pub const SCOPES: &[&str] = &["email", "read_stats", "read_logged_time", "write_logged_time"];

/// Summaries range used when none is given on the command line
pub const DEFAULT_SUMMARY_RANGE: &str = "last 7 days from yesterday";

/// Maximum rows per INSERT statement
/// 6 bound values per row keeps this well below both PostgreSQL (65535)
/// and SQLite (32766) parameter limits
pub const INSERT_CHUNK_ROWS: usize = 1000;

/// Default env file read at startup
pub const DEFAULT_ENV_FILE: &str = ".env";
