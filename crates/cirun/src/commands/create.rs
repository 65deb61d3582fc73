use cirun_client::{CirunClient, report};
use cirun_cloud::{
    AwsProvisioner, AzureProvisioner, GcpProvisioner, ProviderProvisioner, ProvisionObserver,
    ProvisionPlan, ProvisionStep, provision,
};
use colored::Colorize;
use std::io::{BufRead, Write};

use super::super::{CreateArgs, CreateCommands};

pub async fn handle(cmd: CreateCommands) -> anyhow::Result<()> {
    let (provisioner, args): (Box<dyn ProviderProvisioner>, CreateArgs) = match cmd {
        CreateCommands::Aws { args, policy_arn } => (
            Box::new(AwsProvisioner::new(args.name.clone(), Some(policy_arn))),
            args,
        ),
        CreateCommands::Azure { args, role } => (
            Box::new(AzureProvisioner::new(args.name.clone(), Some(role))),
            args,
        ),
        CreateCommands::Gcp {
            args,
            project,
            role,
            key_file,
        } => {
            let gcp = GcpProvisioner::new(args.name.clone(), project, Some(role), key_file)?;
            println!("  Key file: {}", gcp.key_file().display().to_string().cyan());
            (Box::new(gcp), args)
        }
    };

    // Resolve the Cirun configuration before touching the cloud account
    let client = if args.auto_connect {
        Some(CirunClient::from_env(None)?)
    } else {
        None
    };

    println!(
        "{}",
        format!(
            "Creating Cirun credentials for {}...",
            provisioner.display_name()
        )
        .blue()
        .bold()
    );

    let mut console = Console {
        assume_yes: args.yes,
    };
    let provisioned = provision(provisioner.as_ref(), &mut console).await?;

    println!();
    println!(
        "{}",
        format!("✓ Credentials created for {}", provisioned.principal.name)
            .green()
            .bold()
    );
    report::print_success_json(&provisioned.credentials);
    println!(
        "{}",
        "⚠ Store these credentials now, they won't be shown again".yellow()
    );

    if let Some(client) = client {
        println!();
        println!(
            "{}",
            format!("Connecting {} to Cirun...", provisioner.display_name()).blue()
        );
        let response = client
            .cloud_connect(provisioner.cloud(), &provisioned.credentials, true)
            .await?;
        report::print_success_json(&response);
    } else {
        println!(
            "{}",
            format!(
                "Connect them with: cirun cloud connect {} ...",
                provisioner.cloud()
            )
            .dimmed()
        );
    }

    Ok(())
}

/// Progress lines and the [y/N] prompt on the terminal
struct Console {
    assume_yes: bool,
}

impl ProvisionObserver for Console {
    fn on_step(&mut self, step: ProvisionStep<'_>) {
        match step {
            ProvisionStep::ToolFound { version } => {
                println!("  ✓ CLI found: {}", version.dimmed());
            }
            ProvisionStep::Authenticated { identity } => {
                println!(
                    "  ✓ Authenticated as {} ({})",
                    identity.user.cyan(),
                    identity.account
                );
            }
            ProvisionStep::PrincipalCreated { principal } => {
                println!("  ✓ Created {}", principal.id.cyan());
            }
            ProvisionStep::RoleGranted { role } => {
                println!("  ✓ Granted {}", role.cyan());
            }
            ProvisionStep::CredentialMinted => {
                println!("  ✓ Credential issued");
            }
        }
    }

    fn confirm(&mut self, plan: &ProvisionPlan) -> std::io::Result<bool> {
        println!();
        println!("{}", plan.to_string().bold());
        if self.assume_yes {
            return Ok(true);
        }

        print!("Continue? [y/N]: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().lock().read_line(&mut input)?;
        Ok(is_yes(&input))
    }
}

fn is_yes(input: &str) -> bool {
    let answer = input.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cli, CloudCommands, Commands};
    use clap::Parser;

    fn parse_create(args: &[&str]) -> CreateCommands {
        let cli = Cli::try_parse_from(["cirun", "cloud", "create"].iter().chain(args))
            .unwrap_or_else(|e| panic!("{e}"));
        match cli.command {
            Some(Commands::Cloud(CloudCommands::Create(cmd))) => cmd,
            _ => panic!("expected a cloud create command"),
        }
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes("YES\n"));
        assert!(!is_yes("\n"));
        assert!(!is_yes("n\n"));
        assert!(!is_yes("yep\n"));
    }

    #[test]
    fn test_create_defaults() {
        match parse_create(&["aws"]) {
            CreateCommands::Aws { args, policy_arn } => {
                assert_eq!(args.name, "cirun-runner");
                assert!(!args.auto_connect);
                assert!(!args.yes);
                assert_eq!(policy_arn, cirun_cloud::aws::DEFAULT_POLICY_ARN);
            }
            _ => panic!("expected aws"),
        }
    }

    #[test]
    fn test_create_gcp_options() {
        match parse_create(&[
            "gcp",
            "--name",
            "ci-runners",
            "--project",
            "demo",
            "--auto-connect",
            "-y",
        ]) {
            CreateCommands::Gcp {
                args,
                project,
                role,
                key_file,
            } => {
                assert_eq!(args.name, "ci-runners");
                assert!(args.auto_connect);
                assert!(args.yes);
                assert_eq!(project.as_deref(), Some("demo"));
                assert_eq!(role, cirun_cloud::gcp::DEFAULT_ROLE);
                assert!(key_file.is_none());
            }
            _ => panic!("expected gcp"),
        }
    }

    #[test]
    fn test_assume_yes_skips_prompt() {
        let plan = ProvisionPlan {
            cloud: cirun_client::Cloud::Aws,
            principal_kind: "IAM user".into(),
            principal_name: "cirun-runner".into(),
            role: cirun_cloud::aws::DEFAULT_POLICY_ARN.into(),
            scope: "account 123456789012".into(),
        };
        let mut console = Console { assume_yes: true };
        assert!(console.confirm(&plan).unwrap());
    }
}
