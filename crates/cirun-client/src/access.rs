//! Access control model
//!
//! The organization's `.access.yml` maps repositories to policies and
//! policies to resources. The server owns this document; the client only
//! reads it and submits access requests.

use crate::model::Document;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Policy identifier, numeric or textual depending on how it was declared
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicyId {
    Number(i64),
    Text(String),
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyId::Number(n) => write!(f, "{n}"),
            PolicyId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(flatten)]
    pub extra: Document,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessEntry {
    pub resource: String,
    #[serde(default)]
    pub policies: Vec<PolicyId>,
    #[serde(flatten)]
    pub extra: Document,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessYml {
    #[serde(default)]
    pub policies: Vec<Policy>,
    #[serde(default)]
    pub access_control: Vec<AccessEntry>,
    #[serde(flatten)]
    pub extra: Document,
}

/// Access control document returned by `GET access-control`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessControl {
    pub access_yml: AccessYml,
    #[serde(flatten)]
    pub extra: Document,
}

impl AccessControl {
    /// Id of the first policy attached to `repo`
    pub fn repo_policy(&self, repo: &str) -> Option<&PolicyId> {
        self.access_yml
            .policies
            .iter()
            .find(|p| p.repo.as_deref() == Some(repo))
            .map(|p| &p.id)
    }

    /// Resources granted to `repo` through its policy
    ///
    /// Empty when the repository has no policy.
    pub fn repo_resources(&self, repo: &str) -> Vec<String> {
        let Some(policy_id) = self.repo_policy(repo) else {
            return Vec::new();
        };
        self.access_yml
            .access_control
            .iter()
            .filter(|entry| entry.policies.contains(policy_id))
            .map(|entry| entry.resource.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessAction {
    Add,
    Remove,
}

/// Optional constraints on who may use granted resources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceGrant {
    pub teams: Option<Vec<String>>,
    pub roles: Option<Vec<String>>,
    pub users: Option<Vec<String>>,
    /// URL of a JSON document listing users
    pub users_from_json: Option<String>,
    /// Extra policy arguments, e.g. `{"pull_request": true}`
    pub policy_args: Option<Document>,
}

/// One entry of `repository_resource_access`
///
/// Absent constraints are sent as explicit `null`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAccessRequest {
    pub repository: String,
    pub resources: Vec<String>,
    pub action: AccessAction,
    pub policy_args: Option<Document>,
    pub teams: Option<Vec<String>>,
    pub users: Option<Vec<String>>,
    pub roles: Option<Vec<String>>,
    pub users_from_json: Option<String>,
}

impl ResourceAccessRequest {
    pub fn add(repo: impl Into<String>, resources: Vec<String>, grant: ResourceGrant) -> Self {
        Self {
            repository: repo.into(),
            resources,
            action: AccessAction::Add,
            policy_args: grant.policy_args,
            teams: grant.teams,
            users: grant.users,
            roles: grant.roles,
            users_from_json: grant.users_from_json,
        }
    }

    pub fn remove(repo: impl Into<String>, resources: Vec<String>) -> Self {
        Self {
            repository: repo.into(),
            resources,
            action: AccessAction::Remove,
            policy_args: None,
            teams: None,
            users: None,
            roles: None,
            users_from_json: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateAccessControlRequest<'a> {
    pub org: &'a str,
    pub repository_resource_access: &'a [ResourceAccessRequest],
}

#[derive(Debug, Serialize)]
pub(crate) struct AccessControlQuery<'a> {
    pub org: &'a str,
}
