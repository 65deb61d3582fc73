//! Provisioner trait definition

use crate::error::Result;
use async_trait::async_trait;
use cirun_client::{Cloud, Credentials};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Creates a Cirun identity in a cloud account through the provider's CLI
///
/// Implemented once per cloud (AWS, Azure, GCP). The steps are driven in
/// order by [`crate::provision`]; a failing step aborts the workflow and
/// leaves whatever earlier steps created in place.
#[async_trait]
pub trait ProviderProvisioner: Send + Sync {
    /// Cloud the credentials are minted for
    fn cloud(&self) -> Cloud;

    /// Name shown in prompts
    fn display_name(&self) -> &str {
        self.cloud().display_name()
    }

    /// Verify the provider CLI is installed, returning its version line
    async fn check_installed(&self) -> Result<String>;

    /// Verify the operator is logged in and fetch the active account
    async fn check_authenticated(&self) -> Result<Identity>;

    /// Describe what is about to be created, for confirmation
    fn plan(&self, identity: &Identity) -> ProvisionPlan;

    /// Create the IAM user / service principal / service account
    async fn create_principal(&self, identity: &Identity) -> Result<Principal>;

    /// Grant the principal its role
    async fn grant_role(&self, identity: &Identity, principal: &Principal) -> Result<()>;

    /// Mint a long-lived credential for the principal
    async fn mint_credential(
        &self,
        identity: &Identity,
        principal: &Principal,
    ) -> Result<Credentials>;
}

/// Active account of the operator in the provider CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// AWS account id, Azure subscription id or GCP project id
    pub account: String,

    /// Logged-in user or caller ARN
    pub user: String,

    /// Azure tenant id
    pub tenant: Option<String>,
}

/// Created principal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    /// Identifier used in later CLI calls (user name, app id, account email)
    pub id: String,

    /// Human readable name
    pub name: String,
}

/// What a provisioning run will create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionPlan {
    pub cloud: Cloud,
    /// e.g. "IAM user", "service principal", "service account"
    pub principal_kind: String,
    pub principal_name: String,
    pub role: String,
    pub scope: String,
}

impl fmt::Display for ProvisionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Create {} '{}' in {} ({}) with role '{}'",
            self.principal_kind,
            self.principal_name,
            self.cloud.display_name(),
            self.scope,
            self.role
        )
    }
}
