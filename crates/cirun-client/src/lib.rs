//! Cirun API client
//!
//! Typed access to the Cirun REST API: repository activation, cloud
//! connections, GitHub App installation and access control for shared
//! runner resources.
//!
//! # Example
//!
//! ```ignore
//! use cirun_client::{CirunClient, Cloud, Credentials};
//!
//! // Token from CIRUN_API_KEY, endpoint from CIRUN_API_ENDPOINT (optional)
//! let client = CirunClient::from_env(None)?;
//!
//! let repos = client.list_repos(true).await?;
//!
//! let creds = Credentials::new()
//!     .field("access_key", "AKIA...")
//!     .field("secret_key", "...");
//! client.cloud_connect(Cloud::Aws, &creds, true).await?;
//!
//! let resources = client.get_repo_resources("my-org", "my-org/my-repo").await?;
//! ```

pub mod access;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod report;

pub use access::{
    AccessAction, AccessControl, AccessEntry, Policy, PolicyId, ResourceAccessRequest,
    ResourceGrant,
};
pub use client::CirunClient;
pub use config::ClientConfig;
pub use error::{CirunError, Result};
pub use model::{
    Cloud, Credentials, Document, GithubInstallation, RepoActivation, RepositoryName,
};
