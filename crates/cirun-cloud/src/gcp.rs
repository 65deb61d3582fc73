//! GCP provisioner (via gcloud CLI)

use crate::command::ExternalCli;
use crate::error::{CloudError, Result};
use crate::provisioner::{Identity, Principal, ProviderProvisioner, ProvisionPlan};
use crate::retry::{RetryConfig, retry};
use async_trait::async_trait;
use cirun_client::{Cloud, Credentials};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ROLE: &str = "roles/compute.admin";
const INSTALL_HINT: &str = "https://cloud.google.com/sdk/docs/install";
const AUTH_HINT: &str = "Run `gcloud auth login` first";

/// New service accounts take a few seconds to become visible
const PROPAGATION_ATTEMPTS: u32 = 10;
const PROPAGATION_DELAY: Duration = Duration::from_secs(3);

/// Creates a service account with a JSON key
pub struct GcpProvisioner {
    cli: ExternalCli,
    account_id: String,
    project: Option<String>,
    role: String,
    key_file: PathBuf,
    propagation: RetryConfig,
}

impl GcpProvisioner {
    /// `account_id` must be a valid service account id (6-30 characters,
    /// lowercase letters, digits and hyphens, starting with a letter).
    pub fn new(
        account_id: impl Into<String>,
        project: Option<String>,
        role: Option<String>,
        key_file: Option<PathBuf>,
    ) -> Result<Self> {
        let account_id = account_id.into();
        validate_account_id(&account_id)?;
        let key_file = key_file.unwrap_or_else(|| PathBuf::from(format!("{account_id}-key.json")));

        Ok(Self {
            cli: ExternalCli::new("gcloud", INSTALL_HINT),
            account_id,
            project,
            role: role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            key_file,
            propagation: RetryConfig::fixed(PROPAGATION_ATTEMPTS, PROPAGATION_DELAY),
        })
    }

    /// Where the key file is written
    pub fn key_file(&self) -> &std::path::Path {
        &self.key_file
    }

    fn email(&self, project: &str) -> String {
        format!("{}@{}.iam.gserviceaccount.com", self.account_id, project)
    }

    async fn active_project(&self) -> Result<String> {
        if let Some(project) = &self.project {
            return Ok(project.clone());
        }
        let output = self
            .cli
            .run(&["config", "get-value", "project"])
            .await?;
        parse_config_value(&output).ok_or_else(|| {
            CloudError::InvalidConfig(
                "No GCP project configured. Pass --project or run \
                 `gcloud config set project <PROJECT_ID>`"
                    .to_string(),
            )
        })
    }

    /// Poll until the new service account can be described
    async fn wait_until_visible(&self, email: &str, project: &str) -> Result<()> {
        retry(&self.propagation, |attempt| async move {
            tracing::debug!("Waiting for service account {} (attempt {})", email, attempt);
            self.cli
                .run(&[
                    "iam",
                    "service-accounts",
                    "describe",
                    email,
                    "--project",
                    project,
                    "--format",
                    "json",
                ])
                .await
        })
        .await
        .map(|_| ())
        .map_err(|err| {
            CloudError::Timeout(format!(
                "service account {email} did not become available after {} attempts: {err}",
                self.propagation.max_attempts
            ))
        })
    }
}

fn validate_account_id(account_id: &str) -> Result<()> {
    let valid_len = (6..=30).contains(&account_id.len());
    let valid_chars = account_id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let starts_with_letter = account_id.starts_with(|c: char| c.is_ascii_lowercase());
    let ends_well = !account_id.ends_with('-');

    if valid_len && valid_chars && starts_with_letter && ends_well {
        Ok(())
    } else {
        Err(CloudError::InvalidConfig(format!(
            "Invalid service account name '{account_id}': use 6-30 lowercase letters, \
             digits or hyphens, starting with a letter"
        )))
    }
}

/// `gcloud config get-value` prints an empty line or `(unset)` when unset
fn parse_config_value(output: &str) -> Option<String> {
    let value = output.trim();
    if value.is_empty() || value == "(unset)" {
        None
    } else {
        Some(value.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ServiceAccount {
    email: String,
}

#[async_trait]
impl ProviderProvisioner for GcpProvisioner {
    fn cloud(&self) -> Cloud {
        Cloud::Gcp
    }

    async fn check_installed(&self) -> Result<String> {
        self.cli.version(&["--version"]).await
    }

    async fn check_authenticated(&self) -> Result<Identity> {
        let output = self
            .cli
            .run(&[
                "auth",
                "list",
                "--filter=status:ACTIVE",
                "--format=value(account)",
            ])
            .await
            .map_err(self.cli.not_authenticated(AUTH_HINT))?;

        let user = output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| CloudError::NotAuthenticated {
                tool: self.cli.program().to_string(),
                hint: AUTH_HINT.to_string(),
            })?
            .to_string();

        let project = self.active_project().await?;

        Ok(Identity {
            account: project,
            user,
            tenant: None,
        })
    }

    fn plan(&self, identity: &Identity) -> ProvisionPlan {
        ProvisionPlan {
            cloud: Cloud::Gcp,
            principal_kind: "service account".to_string(),
            principal_name: self.email(&identity.account),
            role: self.role.clone(),
            scope: format!("project {}", identity.account),
        }
    }

    async fn create_principal(&self, identity: &Identity) -> Result<Principal> {
        let project = identity.account.as_str();
        let account: ServiceAccount = self
            .cli
            .run_json(&[
                "iam",
                "service-accounts",
                "create",
                self.account_id.as_str(),
                "--project",
                project,
                "--display-name",
                "Cirun",
                "--format",
                "json",
            ])
            .await?;

        self.wait_until_visible(&account.email, project).await?;

        Ok(Principal {
            id: account.email,
            name: self.account_id.clone(),
        })
    }

    async fn grant_role(&self, identity: &Identity, principal: &Principal) -> Result<()> {
        let member = format!("serviceAccount:{}", principal.id);
        self.cli
            .run(&[
                "projects",
                "add-iam-policy-binding",
                identity.account.as_str(),
                "--member",
                member.as_str(),
                "--role",
                self.role.as_str(),
                "--condition=None",
                "--format",
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
        let key_file = self.key_file.to_string_lossy().to_string();
        self.cli
            .run(&[
                "iam",
                "service-accounts",
                "keys",
                "create",
                key_file.as_str(),
                "--iam-account",
                principal.id.as_str(),
                "--project",
                identity.account.as_str(),
            ])
            .await?;

        Ok(Credentials::from_key_file(&self.key_file)?)
    }
}
