use cirun_client::{CirunClient, report};

use super::super::RepoCommands;

pub async fn handle(cmd: RepoCommands) -> anyhow::Result<()> {
    let client = CirunClient::from_env(None)?;

    match cmd {
        RepoCommands::List => {
            let repos = client.list_repos(true).await?;
            report::print_success_json(&repos);
        }
        RepoCommands::Add {
            name,
            installation_id,
        } => {
            let activation = client.set_repo(&name, true, installation_id, true).await?;
            report::print_success_json(&activation);
        }
        RepoCommands::Remove { name } => {
            let activation = client.set_repo(&name, false, None, true).await?;
            report::print_success_json(&activation);
        }
    }

    Ok(())
}
