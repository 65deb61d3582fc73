//! Provisioning workflow
//!
//! Drives a [`ProviderProvisioner`] through its steps. Nothing is rolled
//! back: if granting the role fails, the principal created just before stays
//! in the account and has to be removed with the provider's own tooling.

use crate::error::{CloudError, Result};
use crate::provisioner::{Identity, Principal, ProviderProvisioner, ProvisionPlan};
use cirun_client::Credentials;

/// Progress notifications and the confirmation prompt
pub trait ProvisionObserver {
    fn on_step(&mut self, step: ProvisionStep<'_>);

    /// Ask the operator to approve the plan
    fn confirm(&mut self, plan: &ProvisionPlan) -> std::io::Result<bool>;
}

#[derive(Debug, Clone, Copy)]
pub enum ProvisionStep<'a> {
    ToolFound { version: &'a str },
    Authenticated { identity: &'a Identity },
    PrincipalCreated { principal: &'a Principal },
    RoleGranted { role: &'a str },
    CredentialMinted,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub plan: ProvisionPlan,
    pub identity: Identity,
    pub principal: Principal,
    pub credentials: Credentials,
}

pub async fn provision(
    provisioner: &dyn ProviderProvisioner,
    observer: &mut dyn ProvisionObserver,
) -> Result<Provisioned> {
    let name = provisioner.display_name();

    let version = provisioner.check_installed().await?;
    tracing::info!("{} CLI found: {}", name, version);
    observer.on_step(ProvisionStep::ToolFound { version: &version });

    let identity = provisioner.check_authenticated().await?;
    tracing::info!("{} authenticated as {} ({})", name, identity.user, identity.account);
    observer.on_step(ProvisionStep::Authenticated {
        identity: &identity,
    });

    let plan = provisioner.plan(&identity);
    if !observer.confirm(&plan)? {
        tracing::info!("Provisioning declined: {}", plan);
        return Err(CloudError::Aborted);
    }

    let principal = provisioner.create_principal(&identity).await?;
    tracing::info!("Created {} {}", plan.principal_kind, principal.id);
    observer.on_step(ProvisionStep::PrincipalCreated {
        principal: &principal,
    });

    provisioner.grant_role(&identity, &principal).await?;
    tracing::info!("Granted {} to {}", plan.role, principal.id);
    observer.on_step(ProvisionStep::RoleGranted { role: &plan.role });

    let credentials = provisioner.mint_credential(&identity, &principal).await?;
    observer.on_step(ProvisionStep::CredentialMinted);

    Ok(Provisioned {
        plan,
        identity,
        principal,
        credentials,
    })
}
