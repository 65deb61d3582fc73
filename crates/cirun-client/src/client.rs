//! Cirun REST API client
//!
//! One method per remote operation. Every Cirun request carries a JSON
//! content type and the bearer token from [`ClientConfig`].

use crate::access::{
    AccessControl, AccessControlQuery, ResourceAccessRequest, ResourceGrant,
    UpdateAccessControlRequest,
};
use crate::config::{ClientConfig, GH_TOKEN_ENV_VAR};
use crate::error::{CirunError, Result};
use crate::model::{
    Cloud, CloudConnectRequest, Credentials, Document, GithubInstallation, RepoActivation,
    RepositoryName, SetRepoRequest,
};
use crate::report::{self, RAW_CONTENT_KEY};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

const USER_AGENT: &str = concat!("cirun-cli/", env!("CARGO_PKG_VERSION"));
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Client for the Cirun API
pub struct CirunClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl CirunClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http, config })
    }

    /// Build a client from the environment, see [`ClientConfig::from_env`]
    pub fn from_env(token: Option<String>) -> Result<Self> {
        Self::new(ClientConfig::from_env(token)?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.config.base_url, path);
        tracing::debug!("{} {}", method, url);
        self.http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&self.config.token)
    }

    /// Status 200/201 pass the body through; anything else becomes
    /// [`CirunError::Api`], rendered on stderr first when `print_error` is set.
    fn ensure_success(status: u16, body: Value, print_error: bool) -> Result<Value> {
        if matches!(status, 200 | 201) {
            return Ok(body);
        }
        tracing::debug!("Cirun API returned status {}", status);
        if print_error {
            report::render_api_error(status, &body);
        }
        Err(CirunError::Api { status, body })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        print_error: bool,
    ) -> Result<T> {
        let (status, body) = send(request).await?;
        let body = Self::ensure_success(status, body, print_error)?;
        Ok(serde_json::from_value(body)?)
    }

    // ========== Repositories ==========

    /// All repositories connected to Cirun
    pub async fn list_repos(&self, print_error: bool) -> Result<Value> {
        self.call(self.request(Method::GET, "repo"), print_error)
            .await
    }

    /// Activate or deactivate a repository
    ///
    /// With an `installation_id` the repository is first added to the Cirun
    /// GitHub App installation. A missing `GITHUB_TOKEN` is reported and
    /// skipped; activation still goes ahead.
    pub async fn set_repo(
        &self,
        name: &str,
        active: bool,
        installation_id: Option<u64>,
        print_error: bool,
    ) -> Result<RepoActivation> {
        let github_installation = match installation_id {
            Some(id) => match self.install_github_app(name, id).await {
                Ok(installation) => Some(installation),
                Err(err @ CirunError::GithubTokenMissing { .. }) => {
                    tracing::warn!("{}", err);
                    report::print_error_message(&format!("ERROR: {err}"));
                    None
                }
                Err(err) => return Err(err),
            },
            None => None,
        };

        let request = self.request(Method::POST, "repo").json(&SetRepoRequest {
            repository: name,
            active,
        });
        let response: Document = self.call(request, print_error).await?;

        Ok(RepoActivation {
            response,
            github_installation,
        })
    }

    // ========== GitHub App ==========

    async fn github_repo_id(&self, repo: &RepositoryName) -> Result<u64> {
        #[derive(Deserialize)]
        struct GithubRepo {
            id: u64,
        }

        let url = format!(
            "{}/repos/{}/{}",
            self.config.github_api_url, repo.owner, repo.name
        );
        tracing::debug!("GET {}", url);
        let (status, body) = send(self.http.get(&url).header(ACCEPT, GITHUB_ACCEPT)).await?;
        if !(200..300).contains(&status) {
            report::render_api_error(status, &body);
            return Err(CirunError::Github { status, body });
        }
        let repo: GithubRepo = serde_json::from_value(body)?;
        Ok(repo.id)
    }

    /// Add `name` to the Cirun GitHub App installation `installation_id`
    ///
    /// Uses a personal access token from `GITHUB_TOKEN`, separate from the
    /// Cirun API token.
    pub async fn install_github_app(
        &self,
        name: &str,
        installation_id: u64,
    ) -> Result<GithubInstallation> {
        let repo = RepositoryName::parse(name)?;
        let gh_token = self.config.github_token.as_deref().ok_or_else(|| {
            CirunError::GithubTokenMissing {
                var: GH_TOKEN_ENV_VAR,
                repository: name.to_string(),
            }
        })?;

        let repository_id = self.github_repo_id(&repo).await?;
        let url = format!(
            "{}/user/installations/{}/repositories/{}",
            self.config.github_api_url, installation_id, repository_id
        );
        tracing::debug!("PUT {}", url);
        let request = self
            .http
            .put(&url)
            .bearer_auth(gh_token)
            .header(ACCEPT, GITHUB_ACCEPT);
        let (status, body) = send(request).await?;

        if !matches!(status, 204 | 304) {
            report::render_api_error(status, &body);
            return Err(CirunError::Github { status, body });
        }

        tracing::info!("Added {} to GitHub App installation {}", repo, installation_id);
        Ok(GithubInstallation {
            message: "GitHub Installation done".to_string(),
            status_code: status,
        })
    }

    // ========== Clouds ==========

    /// Cloud providers connected to Cirun
    pub async fn clouds(&self, print_error: bool) -> Result<Value> {
        self.call(self.request(Method::GET, "cloud-connect"), print_error)
            .await
    }

    /// Connect a cloud provider with the given credentials
    pub async fn cloud_connect(
        &self,
        cloud: Cloud,
        credentials: &Credentials,
        print_error: bool,
    ) -> Result<Document> {
        let request = self
            .request(Method::POST, "cloud-connect")
            .json(&CloudConnectRequest { cloud, credentials });
        self.call(request, print_error).await
    }

    // ========== Access control ==========

    /// The organization's access control document, `None` on any non-200 reply
    pub async fn get_access_control(&self, org: &str) -> Result<Option<AccessControl>> {
        let request = self
            .request(Method::GET, "access-control")
            .json(&AccessControlQuery { org });
        let (status, body) = send(request).await?;
        if status != 200 {
            tracing::debug!("No access control for {} (status {})", org, status);
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(body)?))
    }

    /// Submit a batch of access requests
    ///
    /// The server opens a pull request against `<org>/.cirun` updating
    /// `.access.yml`.
    pub async fn update_access_control(
        &self,
        org: &str,
        requests: &[ResourceAccessRequest],
        print_error: bool,
    ) -> Result<Document> {
        let request = self
            .request(Method::PUT, "access-control")
            .json(&UpdateAccessControlRequest {
                org,
                repository_resource_access: requests,
            });
        self.call(request, print_error).await
    }

    /// Grant `repo` access to `resources`
    pub async fn add_repo_to_resources(
        &self,
        org: &str,
        repo: &str,
        resources: Vec<String>,
        grant: ResourceGrant,
        print_error: bool,
    ) -> Result<Document> {
        let request = ResourceAccessRequest::add(repo, resources, grant);
        self.update_access_control(org, &[request], print_error)
            .await
    }

    /// Revoke access of `repo` to `resources`
    pub async fn remove_repo_from_resources(
        &self,
        org: &str,
        repo: &str,
        resources: Vec<String>,
        print_error: bool,
    ) -> Result<Document> {
        let request = ResourceAccessRequest::remove(repo, resources);
        self.update_access_control(org, &[request], print_error)
            .await
    }

    /// Resources `repo` currently has access to
    ///
    /// `None` when the organization has no access control document.
    pub async fn get_repo_resources(&self, org: &str, repo: &str) -> Result<Option<Vec<String>>> {
        let Some(access_control) = self.get_access_control(org).await? else {
            return Ok(None);
        };
        Ok(Some(access_control.repo_resources(repo)))
    }
}

/// Send a request and decode the body as JSON, falling back to
/// `{"responseContent": <text>}` when it is not JSON
async fn send(request: RequestBuilder) -> Result<(u16, Value)> {
    let response = request.send().await?;
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    Ok((status, decode_body(&bytes)))
}

fn decode_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or_else(|_| {
        let mut doc = Document::new();
        doc.insert(
            RAW_CONTENT_KEY.to_string(),
            Value::String(String::from_utf8_lossy(bytes).into_owned()),
        );
        Value::Object(doc)
    })
}
