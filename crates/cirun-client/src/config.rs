//! Client configuration
//!
//! All environment lookups happen here so the rest of the client only ever
//! sees an explicit, validated [`ClientConfig`].

use crate::error::{CirunError, Result};

/// Default production API root
pub const API_ENDPOINT: &str = "https://api.cirun.io/api/v1";
/// Public GitHub REST API root
pub const GITHUB_API: &str = "https://api.github.com";

pub const API_KEY_ENV_VAR: &str = "CIRUN_API_KEY";
pub const API_ENDPOINT_ENV_VAR: &str = "CIRUN_API_ENDPOINT";
pub const GH_TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";
/// Set by GitHub Actions, points at the GitHub Enterprise API when relevant
pub const GH_API_URL_ENV_VAR: &str = "GITHUB_API_URL";

/// Configuration for [`crate::CirunClient`]
#[derive(Clone)]
pub struct ClientConfig {
    pub token: String,
    pub base_url: String,
    pub github_token: Option<String>,
    pub github_api_url: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("github_api_url", &self.github_api_url)
            .finish()
    }
}

impl ClientConfig {
    /// Build a config around an explicit token, without reading the environment
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: API_ENDPOINT.to_string(),
            github_token: None,
            github_api_url: GITHUB_API.to_string(),
        }
    }

    /// Resolve the configuration from environment variables
    ///
    /// An explicit `token` wins over `CIRUN_API_KEY`. Fails with
    /// [`CirunError::CredentialsMissing`] when neither is available.
    pub fn from_env(token: Option<String>) -> Result<Self> {
        let token = match token.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => non_empty_var(API_KEY_ENV_VAR)
                .ok_or(CirunError::CredentialsMissing(API_KEY_ENV_VAR))?,
        };

        let mut config = Self::new(token);
        if let Some(endpoint) = non_empty_var(API_ENDPOINT_ENV_VAR) {
            config = config.with_base_url(endpoint)?;
        }
        if let Some(github_api_url) = non_empty_var(GH_API_URL_ENV_VAR) {
            config = config.with_github_api_url(github_api_url)?;
        }
        config.github_token = non_empty_var(GH_TOKEN_ENV_VAR);

        Ok(config)
    }

    /// Override the API root (must be an absolute http(s) URL)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self> {
        self.base_url = normalize_url(base_url.into())?;
        Ok(self)
    }

    pub fn with_github_token(mut self, token: impl Into<String>) -> Self {
        self.github_token = Some(token.into());
        self
    }

    pub fn with_github_api_url(mut self, url: impl Into<String>) -> Result<Self> {
        self.github_api_url = normalize_url(url.into())?;
        Ok(self)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn normalize_url(url: String) -> Result<String> {
    let parsed =
        reqwest::Url::parse(&url).map_err(|_| CirunError::InvalidEndpoint(url.clone()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CirunError::InvalidEndpoint(url));
    }
    Ok(url.trim_end_matches('/').to_string())
}
