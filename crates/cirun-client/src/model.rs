//! Request and response payloads

use crate::error::{CirunError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Unstructured JSON object, kept in server order
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Cloud providers Cirun can create runners on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cloud {
    Aws,
    Azure,
    Gcp,
    Openstack,
    Oracle,
}

impl Cloud {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cloud::Aws => "aws",
            Cloud::Azure => "azure",
            Cloud::Gcp => "gcp",
            Cloud::Openstack => "openstack",
            Cloud::Oracle => "oracle",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Cloud::Aws => "AWS",
            Cloud::Azure => "Azure",
            Cloud::Gcp => "Google Cloud",
            Cloud::Openstack => "OpenStack",
            Cloud::Oracle => "Oracle Cloud",
        }
    }
}

impl fmt::Display for Cloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider specific credential bundle sent with `cloud-connect`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(Document);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string field, builder style
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0
            .insert(key.into(), serde_json::Value::String(value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }

    /// Decode a JSON object, e.g. a GCP service account key
    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str::<Document>(text).map(Self)
    }

    /// Read a JSON key file from disk
    ///
    /// Fails with [`CirunError::InvalidKeyFile`] if the contents are not a JSON
    /// object. No request is made here, so a bad file never reaches the API.
    pub fn from_key_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CirunError::KeyFileUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| CirunError::InvalidKeyFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl From<Document> for Credentials {
    fn from(doc: Document) -> Self {
        Self(doc)
    }
}

/// `owner/name` repository reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName {
    pub owner: String,
    pub name: String,
}

impl RepositoryName {
    pub fn parse(full_name: &str) -> Result<Self> {
        match full_name.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(CirunError::InvalidRepository(full_name.to_string())),
        }
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SetRepoRequest<'a> {
    pub repository: &'a str,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct CloudConnectRequest<'a> {
    pub cloud: Cloud,
    pub credentials: &'a Credentials,
}

/// Outcome of adding the repository to the Cirun GitHub App installation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubInstallation {
    pub message: String,
    pub status_code: u16,
}

/// Response of a repository activation or deactivation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoActivation {
    #[serde(flatten)]
    pub response: Document,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_installation: Option<GithubInstallation>,
}
