use cirun_client::{CirunClient, Document, ResourceGrant, report};
use serde_json::Value;

use super::super::AccessCommands;

pub async fn handle(cmd: AccessCommands) -> anyhow::Result<()> {
    let client = CirunClient::from_env(None)?;

    match cmd {
        AccessCommands::Resources { org, repo } => {
            let resources = client
                .get_repo_resources(&org, &repo)
                .await?
                .ok_or_else(|| {
                    anyhow::anyhow!("No access control configuration found for '{}'", org)
                })?;
            report::print_success_json(&resources);
        }
        AccessCommands::Grant {
            org,
            repo,
            resources,
            teams,
            roles,
            users,
            users_from_json,
            policy_args,
        } => {
            let grant = ResourceGrant {
                teams: non_empty(teams),
                roles: non_empty(roles),
                users: non_empty(users),
                users_from_json,
                policy_args: policy_document(policy_args),
            };
            let response = client
                .add_repo_to_resources(&org, &repo, resources, grant, true)
                .await?;
            report::print_success_json(&response);
        }
        AccessCommands::Revoke {
            org,
            repo,
            resources,
        } => {
            let response = client
                .remove_repo_from_resources(&org, &repo, resources, true)
                .await?;
            report::print_success_json(&response);
        }
    }

    Ok(())
}

/// Parse `KEY=VALUE`; the value is read as JSON when it parses, else as a string
pub fn parse_policy_arg(arg: &str) -> Result<(String, Value), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{arg}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{arg}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn policy_document(args: Vec<(String, Value)>) -> Option<Document> {
    if args.is_empty() {
        None
    } else {
        Some(args.into_iter().collect())
    }
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() { None } else { Some(values) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccessCommands, Cli, Commands};
    use clap::Parser;
    use serde_json::json;

    #[test]
    fn test_parse_policy_arg() {
        assert_eq!(
            parse_policy_arg("pull_request=true").unwrap(),
            ("pull_request".to_string(), json!(true))
        );
        assert_eq!(
            parse_policy_arg("max=3").unwrap(),
            ("max".to_string(), json!(3))
        );
        assert_eq!(
            parse_policy_arg("branch=main").unwrap(),
            ("branch".to_string(), json!("main"))
        );
        assert_eq!(
            parse_policy_arg("label=a=b").unwrap(),
            ("label".to_string(), json!("a=b"))
        );
        assert!(parse_policy_arg("pull_request").is_err());
        assert!(parse_policy_arg("=true").is_err());
    }

    #[test]
    fn test_policy_document() {
        assert_eq!(policy_document(vec![]), None);
        let doc = policy_document(vec![("pull_request".into(), json!(true))]).unwrap();
        assert_eq!(Value::Object(doc), json!({"pull_request": true}));
    }

    #[test]
    fn test_grant_arguments() {
        let cli = Cli::try_parse_from([
            "cirun",
            "access",
            "grant",
            "aktechlabs",
            "cirun-py",
            "-r",
            "gpu-runner",
            "--resource",
            "arm-runner",
            "--team",
            "maintainers",
            "--policy-arg",
            "pull_request=true",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        match cli.command {
            Some(Commands::Access(AccessCommands::Grant {
                org,
                repo,
                resources,
                teams,
                users,
                policy_args,
                ..
            })) => {
                assert_eq!(org, "aktechlabs");
                assert_eq!(repo, "cirun-py");
                assert_eq!(resources, vec!["gpu-runner", "arm-runner"]);
                assert_eq!(non_empty(teams), Some(vec!["maintainers".to_string()]));
                assert_eq!(non_empty(users), None);
                assert_eq!(policy_args, vec![("pull_request".to_string(), json!(true))]);
            }
            _ => panic!("expected access grant"),
        }
    }

    #[test]
    fn test_grant_requires_resource() {
        let result = Cli::try_parse_from(["cirun", "access", "grant", "aktechlabs", "cirun-py"]);
        assert!(result.is_err());
    }
}
