//! OAuth 2.0 authorization-code grant against WakaTime
//!
//! The flow is interactive: the operator opens the authorize URL in a browser,
//! approves the app, and pastes the code shown on the redirect page back into
//! the terminal. Getting the code is delegated to a [`CodeProvider`] so the
//! blocking console prompt can be swapped out.

use std::fmt;
use std::io::{BufRead, Write};
use std::time::Duration;

use rand::RngCore;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::constants::{API_BASE_URL, AUTHORIZE_URL, REDIRECT_URI, SCOPES, TOKEN_URL};
use crate::session::AuthorizedSession;

type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for the authorization flow
#[derive(Debug)]
pub enum OAuthError {
    /// HTTP request failed
    RequestFailed(reqwest::Error),

    /// Token endpoint answered with a non-success status
    TokenEndpoint { status: u16, body: String },

    /// Failed to parse a response or the pasted input
    ParseError(String),

    /// State returned with the redirect differs from the one we generated
    StateMismatch { expected: String, received: String },

    /// Operator supplied nothing
    EmptyCode,

    /// Code provider failed (e.g. stdin closed)
    CodeInput(String),
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed(e) => write!(f, "HTTP request failed: {e}"),
            Self::TokenEndpoint { status, body } => {
                write!(f, "Token endpoint returned HTTP {status}: {body}")
            }
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::StateMismatch { expected, received } => {
                write!(f, "State mismatch (CSRF): expected {expected}, received {received}")
            }
            Self::EmptyCode => write!(f, "No authorization code entered"),
            Self::CodeInput(msg) => write!(f, "Could not read authorization code: {msg}"),
        }
    }
}

impl std::error::Error for OAuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RequestFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err)
    }
}

/// Endpoints of the OAuth service
///
/// `Default` points at wakatime.com; tests aim it at a local server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthEndpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub api_base_url: String,
    pub redirect_uri: String,
}

impl Default for OAuthEndpoints {
    fn default() -> Self {
        Self {
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            api_base_url: API_BASE_URL.to_string(),
            redirect_uri: REDIRECT_URI.to_string(),
        }
    }
}

/// Source of the authorization code for a given authorize URL
pub trait CodeProvider {
    fn authorization_code(&mut self, authorize_url: &str) -> Result<String, DynError>;
}

/// Prints the authorize URL and blocks on one line of stdin
pub struct ConsoleCodeProvider;

impl CodeProvider for ConsoleCodeProvider {
    fn authorization_code(&mut self, authorize_url: &str) -> Result<String, DynError> {
        let banner = "*".repeat(80);
        println!("**** Visit this url in your browser ****");
        println!("{}", banner);
        println!("{}", authorize_url);
        println!("{}", banner);
        println!("**** After clicking Authorize, paste code here and press Enter ****");
        print!("Enter code from url: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err("stdin closed before a code was entered".into());
        }
        Ok(line)
    }
}

/// Hands out a code known in advance (`--code`, tests)
pub struct FixedCodeProvider {
    code: String,
}

impl FixedCodeProvider {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl CodeProvider for FixedCodeProvider {
    fn authorization_code(&mut self, authorize_url: &str) -> Result<String, DynError> {
        log::debug!("Using pre-supplied authorization code for {}", authorize_url);
        Ok(self.code.clone())
    }
}

/// Token endpoint response
///
/// WakaTime answers form-encoded unless asked for JSON; both decode into this.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Generate a random state token for CSRF protection
///
/// 40 random bytes, SHA-256 hashed, hex encoded (64 characters).
pub fn generate_state() -> String {
    let mut bytes = [0u8; 40];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(Sha256::digest(bytes))
}

/// Pull the authorization code out of what the operator pasted
///
/// Accepts either the bare code or the whole redirect URL. A state carried by
/// the URL must match `expected_state`; a bare code cannot be checked.
pub fn extract_code(input: &str, expected_state: &str) -> Result<String, OAuthError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(OAuthError::EmptyCode);
    }

    let Ok(url) = url::Url::parse(input) else {
        return Ok(input.to_string());
    };

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(received) = state {
        if received != expected_state {
            return Err(OAuthError::StateMismatch {
                expected: expected_state.to_string(),
                received,
            });
        }
    }

    match code {
        Some(code) if !code.is_empty() => Ok(code),
        _ => Err(OAuthError::ParseError(format!(
            "pasted URL has no code parameter: {}",
            input
        ))),
    }
}

/// Decode a token endpoint body, JSON or form-encoded
pub fn parse_token_response(content_type: &str, body: &str) -> Result<TokenResponse, OAuthError> {
    let trimmed = body.trim();
    if content_type.contains("json") || trimmed.starts_with('{') {
        return serde_json::from_str(trimmed)
            .map_err(|e| OAuthError::ParseError(format!("token response: {e}")));
    }

    let mut access_token = None;
    let mut response = TokenResponse {
        access_token: String::new(),
        refresh_token: None,
        token_type: None,
        scope: None,
    };
    for (key, value) in url::form_urlencoded::parse(trimmed.as_bytes()) {
        match key.as_ref() {
            "access_token" => access_token = Some(value.into_owned()),
            "refresh_token" => response.refresh_token = Some(value.into_owned()),
            "token_type" => response.token_type = Some(value.into_owned()),
            "scope" => response.scope = Some(value.into_owned()),
            _ => {}
        }
    }

    response.access_token = access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| OAuthError::ParseError("token response has no access_token".to_string()))?;
    Ok(response)
}

/// Client description of the WakaTime OAuth service
pub struct WakaTimeService {
    client_id: String,
    client_secret: String,
    endpoints: OAuthEndpoints,
    http: Client,
}

impl WakaTimeService {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        endpoints: OAuthEndpoints,
    ) -> Result<Self, DynError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            endpoints,
            http,
        })
    }

    /// Build the URL the operator opens in a browser
    pub fn authorize_url(&self, state: &str) -> String {
        let scope = SCOPES.join(",");
        let params = [
            ("client_id", self.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", self.endpoints.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("state", state),
        ];

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.endpoints.authorize_url, query_string)
    }

    /// Run the whole grant: state, prompt, code exchange
    pub fn authorize(&self, provider: &mut dyn CodeProvider) -> Result<AuthorizedSession, DynError> {
        let state = generate_state();
        let url = self.authorize_url(&state);

        let pasted = provider
            .authorization_code(&url)
            .map_err(|e| OAuthError::CodeInput(e.to_string()))?;
        let code = extract_code(&pasted, &state)?;

        log::info!("Getting an access token...");
        let token = self.exchange_code(&code)?;
        AuthorizedSession::new(self.http.clone(), &self.endpoints.api_base_url, token.access_token)
    }

    /// Exchange an authorization code for an access token
    pub fn exchange_code(&self, code: &str) -> Result<TokenResponse, OAuthError> {
        if code.trim().is_empty() {
            return Err(OAuthError::EmptyCode);
        }

        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.endpoints.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(&self.endpoints.token_url)
            .header(ACCEPT, "application/x-www-form-urlencoded")
            .form(&form)
            .send()?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text()?;

        if !status.is_success() {
            return Err(OAuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let token = parse_token_response(&content_type, &body)?;
        log::debug!(
            "Token issued (type: {}, scope: {})",
            token.token_type.as_deref().unwrap_or("unknown"),
            token.scope.as_deref().unwrap_or("unknown")
        );
        Ok(token)
    }
}
