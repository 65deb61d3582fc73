use cirun_client::{CirunClient, Cloud, Credentials, report};

use super::super::ConnectCommands;

pub async fn handle_list() -> anyhow::Result<()> {
    let client = CirunClient::from_env(None)?;
    let clouds = client.clouds(true).await?;
    report::print_success_json(&clouds);
    Ok(())
}

pub async fn handle_connect(cmd: ConnectCommands) -> anyhow::Result<()> {
    // Key files are read before any API configuration is resolved
    let (cloud, credentials) = connect_payload(cmd)?;
    tracing::debug!("Connecting {} to Cirun", cloud.display_name());

    let client = CirunClient::from_env(None)?;
    let response = client.cloud_connect(cloud, &credentials, true).await?;
    report::print_success_json(&response);
    Ok(())
}

fn connect_payload(cmd: ConnectCommands) -> cirun_client::Result<(Cloud, Credentials)> {
    let payload = match cmd {
        ConnectCommands::Aws {
            access_key,
            secret_key,
        } => (
            Cloud::Aws,
            Credentials::new()
                .field("access_key", access_key)
                .field("secret_key", secret_key),
        ),
        ConnectCommands::Azure {
            subscription_id,
            tenant_id,
            client_id,
            client_secret,
        } => (
            Cloud::Azure,
            Credentials::new()
                .field("subscription_id", subscription_id)
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", client_secret),
        ),
        ConnectCommands::Gcp { key_file } => (Cloud::Gcp, Credentials::from_key_file(&key_file)?),
        ConnectCommands::Openstack {
            username,
            password,
            auth_url,
            project_id,
            domain_id,
            network,
        } => (
            Cloud::Openstack,
            Credentials::new()
                .field("username", username)
                .field("password", password)
                .field("auth_url", auth_url)
                .field("project_id", project_id)
                .field("domain_id", domain_id)
                .field("network", network),
        ),
        ConnectCommands::Oracle { key_file } => {
            (Cloud::Oracle, Credentials::from_key_file(&key_file)?)
        }
    };
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cli, CloudCommands, Commands};
    use cirun_client::CirunError;
    use clap::Parser;
    use serde_json::json;
    use std::io::Write;

    fn parse_connect(args: &[&str]) -> ConnectCommands {
        let cli = Cli::try_parse_from(["cirun", "cloud", "connect"].iter().chain(args))
            .unwrap_or_else(|e| panic!("{e}"));
        match cli.command {
            Some(Commands::Cloud(CloudCommands::Connect(cmd))) => cmd,
            _ => panic!("expected a cloud connect command"),
        }
    }

    fn body(cloud: Cloud, credentials: &Credentials) -> serde_json::Value {
        json!({"cloud": cloud, "credentials": credentials})
    }

    #[test]
    fn test_aws_payload() {
        let cmd = parse_connect(&["aws", "--access-key", "K", "--secret-key", "S"]);
        let (cloud, credentials) = connect_payload(cmd).unwrap();
        assert_eq!(
            serde_json::to_string(&body(cloud, &credentials)).unwrap(),
            r#"{"cloud":"aws","credentials":{"access_key":"K","secret_key":"S"}}"#
        );
    }

    #[test]
    fn test_azure_payload() {
        let cmd = parse_connect(&[
            "azure",
            "--subscription-id",
            "sub",
            "--tenant-id",
            "tenant",
            "--client-id",
            "client",
            "--client-secret",
            "secret",
        ]);
        let (cloud, credentials) = connect_payload(cmd).unwrap();
        assert_eq!(cloud, Cloud::Azure);
        assert_eq!(
            serde_json::to_value(&credentials).unwrap(),
            json!({
                "subscription_id": "sub",
                "tenant_id": "tenant",
                "client_id": "client",
                "client_secret": "secret"
            })
        );
    }

    #[test]
    fn test_openstack_payload() {
        let cmd = parse_connect(&[
            "openstack",
            "--username",
            "u",
            "--password",
            "p",
            "--auth-url",
            "https://keystone.example.com:5000/v3",
            "--project-id",
            "proj",
            "--domain-id",
            "default",
            "--network",
            "public",
        ]);
        let (cloud, credentials) = connect_payload(cmd).unwrap();
        assert_eq!(cloud, Cloud::Openstack);
        assert_eq!(
            credentials.get("auth_url"),
            Some(&json!("https://keystone.example.com:5000/v3"))
        );
        assert_eq!(credentials.as_document().len(), 6);
    }

    #[test]
    fn test_gcp_payload_reads_key_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"type": "service_account", "project_id": "demo"}}"#).unwrap();
        let path = file.path().to_str().unwrap();

        let cmd = parse_connect(&["gcp", "--key-file", path]);
        let (cloud, credentials) = connect_payload(cmd).unwrap();
        assert_eq!(cloud, Cloud::Gcp);
        assert_eq!(credentials.get("project_id"), Some(&json!("demo")));
    }

    #[test]
    fn test_oracle_invalid_key_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[oracle]\nuser=ocid1.user").unwrap();
        let path = file.path().to_str().unwrap();

        let err = connect_payload(parse_connect(&["oracle", "--key-file", path])).unwrap_err();
        assert!(matches!(err, CirunError::InvalidKeyFile { .. }));
    }

    #[test]
    fn test_connect_flags_are_required() {
        let result = Cli::try_parse_from(["cirun", "cloud", "connect", "aws", "--access-key", "K"]);
        assert!(result.is_err());
    }
}
