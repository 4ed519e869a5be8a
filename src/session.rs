use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use url::Url;

type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Access token plus the means to issue authenticated GETs against the API
pub struct AuthorizedSession {
    http: Client,
    base_url: Url,
    access_token: String,
}

impl AuthorizedSession {
    /// Wrap an access token for requests relative to `base_url`
    ///
    /// A missing trailing slash is added so relative paths append instead of
    /// replacing the last segment.
    pub fn new(http: Client, base_url: &str, access_token: String) -> Result<Self, DynError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            http,
            base_url: Url::parse(&base)?,
            access_token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET `path` (relative to the base URL) and decode the JSON body
    ///
    /// Non-success statuses are errors.
    pub fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, DynError> {
        let url = self.base_url.join(path)?;
        log::debug!("GET {}", url);

        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.access_token)
            .query(query)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(format!("GET {} failed with HTTP {}: {}", url, status, body).into());
        }

        let body = response.text()?;
        let value = serde_json::from_str(&body)
            .map_err(|e| format!("Unexpected JSON from {}: {}", url, e))?;
        Ok(value)
    }
}

impl std::fmt::Debug for AuthorizedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedSession")
            .field("base_url", &self.base_url.as_str())
            .field("access_token", &"<redacted>")
            .finish()
    }
}
