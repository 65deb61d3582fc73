mod commands;

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cirun")]
#[command(about = "Cirun CLI 🚀 Self-hosted GitHub Actions runners on your cloud", long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Shows Cirun CLI version
    #[arg(short = 'v', long = "version")]
    version: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage Repository Activation/Deactivation
    #[command(subcommand)]
    Repo(RepoCommands),
    /// Manage cloud providers
    #[command(subcommand)]
    Cloud(CloudCommands),
    /// Manage access to shared runner resources
    #[command(subcommand)]
    Access(AccessCommands),
}

/// Repository subcommands
#[derive(Subcommand)]
enum RepoCommands {
    /// List repositories connected to Cirun
    List,
    /// Activate Cirun on a repository
    Add {
        /// Repository name, for example: cirunlabs/cirun
        name: String,
        /// GitHub installation ID of the Cirun App; the repository is added to
        /// that installation first (requires GITHUB_TOKEN)
        #[arg(long)]
        installation_id: Option<u64>,
    },
    /// Deactivate Cirun on a repository
    Remove {
        /// Repository name, for example: cirunlabs/cirun
        name: String,
    },
}

/// Cloud subcommands
#[derive(Subcommand)]
enum CloudCommands {
    /// List connected cloud providers
    List,
    /// Connect cloud providers
    #[command(subcommand)]
    Connect(ConnectCommands),
    /// Create Cirun credentials with the provider's own CLI
    #[command(subcommand)]
    Create(CreateCommands),
}

/// Cloud connect subcommands
#[derive(Subcommand)]
enum ConnectCommands {
    /// Connect AWS to Cirun
    Aws {
        /// AWS_ACCESS_KEY_ID
        #[arg(long)]
        access_key: String,
        /// AWS_SECRET_ACCESS_KEY
        #[arg(long)]
        secret_key: String,
    },
    /// Connect Azure cloud to Cirun
    Azure {
        /// Azure subscription_id
        #[arg(long)]
        subscription_id: String,
        /// Azure tenant_id
        #[arg(long)]
        tenant_id: String,
        /// Azure client_id
        #[arg(long)]
        client_id: String,
        /// Azure client_secret
        #[arg(long)]
        client_secret: String,
    },
    /// Connect GCP to Cirun
    Gcp {
        /// GCP Service Account Key file
        #[arg(long)]
        key_file: PathBuf,
    },
    /// Connect OpenStack to Cirun
    Openstack {
        /// OpenStack username
        #[arg(long)]
        username: String,
        /// OpenStack password
        #[arg(long)]
        password: String,
        /// OpenStack auth_url
        #[arg(long)]
        auth_url: String,
        /// OpenStack project_id
        #[arg(long)]
        project_id: String,
        /// OpenStack domain_id
        #[arg(long)]
        domain_id: String,
        /// OpenStack network
        #[arg(long)]
        network: String,
    },
    /// Connect Oracle Cloud to Cirun
    Oracle {
        /// Oracle Cloud API key file (JSON)
        #[arg(long)]
        key_file: PathBuf,
    },
}

/// Options shared by every `cloud create` provider
#[derive(Args)]
struct CreateArgs {
    /// Name of the IAM user / service principal / service account to create
    #[arg(long, default_value = "cirun-runner")]
    name: String,
    /// Connect the new credentials to Cirun right away
    #[arg(long)]
    auto_connect: bool,
    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,
}

/// Cloud create subcommands
#[derive(Subcommand)]
enum CreateCommands {
    /// Create an IAM user and access key with the aws CLI
    Aws {
        #[command(flatten)]
        args: CreateArgs,
        /// Managed policy attached to the user
        #[arg(long, default_value = cirun_cloud::aws::DEFAULT_POLICY_ARN)]
        policy_arn: String,
    },
    /// Create a service principal and client secret with the az CLI
    Azure {
        #[command(flatten)]
        args: CreateArgs,
        /// Role assigned on the subscription
        #[arg(long, default_value = cirun_cloud::azure::DEFAULT_ROLE)]
        role: String,
    },
    /// Create a service account and JSON key with the gcloud CLI
    Gcp {
        #[command(flatten)]
        args: CreateArgs,
        /// GCP project (defaults to the active gcloud project)
        #[arg(long)]
        project: Option<String>,
        /// Role granted on the project
        #[arg(long, default_value = cirun_cloud::gcp::DEFAULT_ROLE)]
        role: String,
        /// Where to write the service account key (defaults to <NAME>-key.json)
        #[arg(long)]
        key_file: Option<PathBuf>,
    },
}

/// Access control subcommands
#[derive(Subcommand)]
enum AccessCommands {
    /// Show the resources a repository has access to
    Resources {
        /// GitHub organization
        org: String,
        /// Repository name within the organization
        repo: String,
    },
    /// Grant a repository access to resources (opens a PR on <org>/.cirun)
    Grant {
        /// GitHub organization
        org: String,
        /// Repository name within the organization
        repo: String,
        /// Resource to grant (repeatable)
        #[arg(short = 'r', long = "resource", required = true)]
        resources: Vec<String>,
        /// Team allowed to use the resources (repeatable)
        #[arg(long = "team")]
        teams: Vec<String>,
        /// Role allowed to use the resources (repeatable)
        #[arg(long = "role")]
        roles: Vec<String>,
        /// User allowed to use the resources (repeatable)
        #[arg(long = "user")]
        users: Vec<String>,
        /// URL of a JSON list of allowed users
        #[arg(long)]
        users_from_json: Option<String>,
        /// Extra policy argument as KEY=VALUE, e.g. pull_request=true (repeatable)
        #[arg(long = "policy-arg", value_parser = commands::access::parse_policy_arg)]
        policy_args: Vec<(String, serde_json::Value)>,
    },
    /// Revoke a repository's access to resources (opens a PR on <org>/.cirun)
    Revoke {
        /// GitHub organization
        org: String,
        /// Repository name within the organization
        repo: String,
        /// Resource to revoke (repeatable)
        #[arg(short = 'r', long = "resource", required = true)]
        resources: Vec<String>,
    },
}

fn init_tracing() {
    // stdout carries JSON results, logs go to stderr
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    if cli.version {
        println!("cirun {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let Some(command) = cli.command else {
        if let Err(err) = Cli::command().print_help() {
            tracing::debug!("Failed to print help: {}", err);
        }
        std::process::exit(2);
    };

    let result = match command {
        Commands::Repo(cmd) => commands::repo::handle(cmd).await,
        Commands::Cloud(CloudCommands::List) => commands::cloud::handle_list().await,
        Commands::Cloud(CloudCommands::Connect(cmd)) => commands::cloud::handle_connect(cmd).await,
        Commands::Cloud(CloudCommands::Create(cmd)) => commands::create::handle(cmd).await,
        Commands::Access(cmd) => commands::access::handle(cmd).await,
    };

    if let Err(err) = result {
        commands::report_failure(&err);
        std::process::exit(1);
    }
}
