//! Azure provisioner (via az CLI)

use crate::command::ExternalCli;
use crate::error::Result;
use crate::provisioner::{Identity, Principal, ProviderProvisioner, ProvisionPlan};
use async_trait::async_trait;
use cirun_client::{Cloud, Credentials};
use serde::Deserialize;

pub const DEFAULT_ROLE: &str = "Contributor";
const INSTALL_HINT: &str = "https://learn.microsoft.com/cli/azure/install-azure-cli";
const AUTH_HINT: &str = "Run `az login` first";

/// Creates an app registration + service principal with a client secret
pub struct AzureProvisioner {
    cli: ExternalCli,
    app_name: String,
    role: String,
}

impl AzureProvisioner {
    pub fn new(app_name: impl Into<String>, role: Option<String>) -> Self {
        Self {
            cli: ExternalCli::new("az", INSTALL_HINT),
            app_name: app_name.into(),
            role: role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        }
    }

    fn scope(subscription_id: &str) -> String {
        format!("/subscriptions/{subscription_id}")
    }
}

#[derive(Debug, Deserialize)]
struct AzVersion {
    #[serde(rename = "azure-cli")]
    azure_cli: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Account {
    id: String,
    tenant_id: String,
    user: AccountUser,
}

#[derive(Debug, Deserialize)]
struct AccountUser {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppRegistration {
    app_id: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct CredentialReset {
    #[serde(rename = "appId")]
    app_id: String,
    password: String,
    tenant: String,
}

fn service_principal_credentials(subscription_id: &str, reset: CredentialReset) -> Credentials {
    Credentials::new()
        .field("subscription_id", subscription_id)
        .field("tenant_id", reset.tenant)
        .field("client_id", reset.app_id)
        .field("client_secret", reset.password)
}

#[async_trait]
impl ProviderProvisioner for AzureProvisioner {
    fn cloud(&self) -> Cloud {
        Cloud::Azure
    }

    async fn check_installed(&self) -> Result<String> {
        let version: AzVersion = self.cli.run_json(&["version", "--output", "json"]).await?;
        Ok(format!("azure-cli {}", version.azure_cli))
    }

    async fn check_authenticated(&self) -> Result<Identity> {
        let account: Account = self
            .cli
            .run_json(&["account", "show", "--output", "json"])
            .await
            .map_err(self.cli.not_authenticated(AUTH_HINT))?;

        Ok(Identity {
            account: account.id,
            user: account.user.name,
            tenant: Some(account.tenant_id),
        })
    }

    fn plan(&self, identity: &Identity) -> ProvisionPlan {
        ProvisionPlan {
            cloud: Cloud::Azure,
            principal_kind: "service principal".to_string(),
            principal_name: self.app_name.clone(),
            role: self.role.clone(),
            scope: format!("subscription {}", identity.account),
        }
    }

    async fn create_principal(&self, _identity: &Identity) -> Result<Principal> {
        let app: AppRegistration = self
            .cli
            .run_json(&[
                "ad",
                "app",
                "create",
                "--display-name",
                self.app_name.as_str(),
                "--output",
                "json",
            ])
            .await?;

        self.cli
            .run(&[
                "ad",
                "sp",
                "create",
                "--id",
                app.app_id.as_str(),
                "--output",
                "json",
            ])
            .await?;

        Ok(Principal {
            id: app.app_id,
            name: app.display_name,
        })
    }

    async fn grant_role(&self, identity: &Identity, principal: &Principal) -> Result<()> {
        let scope = Self::scope(&identity.account);
        self.cli
            .run(&[
                "role",
                "assignment",
                "create",
                "--assignee",
                principal.id.as_str(),
                "--role",
                self.role.as_str(),
                "--scope",
                scope.as_str(),
                "--output",
                "json",
            ])
            .await?;
        Ok(())
    }

    async fn mint_credential(
        &self,
        identity: &Identity,
        principal: &Principal,
    ) -> Result<Credentials> {
        let reset: CredentialReset = self
            .cli
            .run_json(&[
                "ad",
                "app",
                "credential",
                "reset",
                "--id",
                principal.id.as_str(),
                "--display-name",
                "cirun",
                "--output",
                "json",
            ])
            .await?;

        Ok(service_principal_credentials(&identity.account, reset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_account() {
        let account: Account = serde_json::from_str(
            r#"{
                "environmentName": "AzureCloud",
                "id": "00000000-1111-2222-3333-444444444444",
                "isDefault": true,
                "name": "Pay-As-You-Go",
                "state": "Enabled",
                "tenantId": "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee",
                "user": {"name": "admin@example.com", "type": "user"}
            }"#,
        )
        .unwrap();
        assert_eq!(account.id, "00000000-1111-2222-3333-444444444444");
        assert_eq!(account.tenant_id, "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee");
        assert_eq!(account.user.name, "admin@example.com");
    }

    #[test]
    fn test_parse_version() {
        let version: AzVersion = serde_json::from_str(
            r#"{"azure-cli": "2.56.0", "azure-cli-core": "2.56.0", "extensions": {}}"#,
        )
        .unwrap();
        assert_eq!(version.azure_cli, "2.56.0");
    }

    #[test]
    fn test_credentials_from_reset() {
        let reset: CredentialReset = serde_json::from_str(
            r#"{
                "appId": "app-123",
                "password": "s3cr3t",
                "tenant": "tenant-456"
            }"#,
        )
        .unwrap();
        let creds = service_principal_credentials("sub-789", reset);
        assert_eq!(
            serde_json::to_value(&creds).unwrap(),
            json!({
                "subscription_id": "sub-789",
                "tenant_id": "tenant-456",
                "client_id": "app-123",
                "client_secret": "s3cr3t"
            })
        );
    }

    #[test]
    fn test_plan_scope_is_subscription() {
        let identity = Identity {
            account: "sub-789".into(),
            user: "admin@example.com".into(),
            tenant: Some("tenant-456".into()),
        };
        let plan = AzureProvisioner::new("cirun-runner", None).plan(&identity);
        assert_eq!(plan.role, DEFAULT_ROLE);
        assert_eq!(plan.scope, "subscription sub-789");
        assert_eq!(AzureProvisioner::scope("sub-789"), "/subscriptions/sub-789");
    }
}
